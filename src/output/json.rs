//! JSON report of a batch

use crate::state::ResultMap;
use crate::ScoutError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// The document written at the end of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub extracted_data: ResultMap,
}

impl BatchReport {
    pub fn new(extracted_data: ResultMap) -> Self {
        Self {
            generated_at: Utc::now(),
            extracted_data,
        }
    }
}

/// Writes the report as pretty JSON
///
/// # Arguments
///
/// * `report` - The report to write
/// * `path` - Destination file; stdout when `None`
///
/// # Returns
///
/// * `Ok(())` - Report written
/// * `Err(ScoutError)` - Serialization or I/O failed
pub fn write_report(report: &BatchReport, path: Option<&Path>) -> Result<(), ScoutError> {
    let json = serde_json::to_string_pretty(report)?;

    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, json + "\n")?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }

    Ok(())
}
