//! URL handling module for Sitescout
//!
//! This module decides which scan entries are crawlable targets and whether a
//! scan should go through the web-search fallback instead.

mod target;

// Re-export main functions
pub use target::{
    classify_scan, is_crawlable_url, parse_target, parse_targets, strip_fragment, ScanInput,
    MAX_QUERY_LEN,
};
