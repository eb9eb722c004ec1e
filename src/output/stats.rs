//! Statistics over a batch's results
//!
//! This module provides functionality for summarizing a `ResultMap` and
//! displaying the summary.

use crate::crawler::CAPTCHA_WARNING;
use crate::state::ResultMap;
use std::collections::BTreeMap;

/// Batch statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStatistics {
    /// Total number of records, contact pages included
    pub total_records: usize,

    /// Records with an extracted profile
    pub resolved: usize,

    /// Records without a profile
    pub failed: usize,

    /// Failed records by error code
    pub failures_by_code: BTreeMap<u16, usize>,

    /// Records created for contact pages
    pub contact_pages: usize,

    /// Records extracted from behind a CAPTCHA
    pub captcha_flagged: usize,

    /// Resolved records still missing a contact channel
    pub incomplete: usize,
}

impl BatchStatistics {
    /// Summarizes a batch
    ///
    /// # Arguments
    ///
    /// * `results` - The batch's records
    /// * `targets` - The URLs the batch was asked to process; every other
    ///   record is counted as a contact page
    pub fn from_results(results: &ResultMap, targets: &[String]) -> Self {
        let mut stats = Self::default();

        for (url, record) in results.iter() {
            stats.total_records += 1;

            if !targets.contains(url) {
                stats.contact_pages += 1;
            }

            match &record.info {
                Some(info) => {
                    stats.resolved += 1;
                    if info.is_incomplete() {
                        stats.incomplete += 1;
                    }
                    if record.err.as_deref() == Some(CAPTCHA_WARNING) {
                        stats.captcha_flagged += 1;
                    }
                }
                None => {
                    stats.failed += 1;
                    if let Some(code) = record.err_code {
                        *stats.failures_by_code.entry(code).or_insert(0) += 1;
                    }
                }
            }
        }

        stats
    }

    /// Share of records with an extracted profile, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total_records > 0 {
            (self.resolved as f64 / self.total_records as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &BatchStatistics) {
    println!("=== Batch Statistics ===\n");

    println!("Overview:");
    println!("  Records: {}", stats.total_records);
    println!("  Contact pages: {}", stats.contact_pages);
    println!("  Resolved: {}", stats.resolved);
    println!("  Failed: {}", stats.failed);
    println!();

    if stats.resolved > 0 {
        println!("Resolved Records:");
        println!("  Missing contact details: {}", stats.incomplete);
        println!("  Behind a CAPTCHA: {}", stats.captcha_flagged);
        println!();
    }

    if !stats.failures_by_code.is_empty() {
        println!("Failures by Code:");
        let mut counts: Vec<_> = stats.failures_by_code.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (code, count) in counts {
            println!("  {}: {}", code, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} records extracted)",
        stats.success_rate(),
        stats.resolved,
        stats.total_records
    );
}
