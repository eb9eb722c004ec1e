//! Output module for batch results
//!
//! This module handles:
//! - Writing the JSON report of a batch
//! - Computing and printing batch statistics

mod json;
pub mod stats;

pub use json::{write_report, BatchReport};
pub use stats::{print_statistics, BatchStatistics};
