//! State module for tracking batch progress
//!
//! # Components
//!
//! - `UrlRecord`: What is known about a single URL (profile, error, attempts)
//! - `ResultMap`: The URL → record accumulator returned by a batch
//! - `RetryContext`: Retry counter and proxy index carried between passes

mod record;
mod result_map;
mod retry;

// Re-export main types
pub use record::UrlRecord;
pub use result_map::ResultMap;
pub use retry::RetryContext;
