//! Per-URL extraction record
//!
//! A record is created when a URL enters a pass and is updated in place as the
//! URL is loaded, extracted and (possibly) crawled for contact pages.

use crate::crawler::{ErrorKind, Outcome};
use crate::extract::CompanyInfo;
use serde::{Deserialize, Serialize};

/// Everything known about one URL in a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// Extracted profile; present once a load succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<CompanyInfo>,

    /// Contact pages discovered on this page
    #[serde(rename = "otherWebsiteUrls", default)]
    pub other_urls: Vec<String>,

    /// Message of the last failure or warning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,

    #[serde(rename = "errCode", skip_serializing_if = "Option::is_none")]
    pub err_code: Option<u16>,

    #[serde(rename = "errKind", skip_serializing_if = "Option::is_none")]
    pub err_kind: Option<ErrorKind>,

    /// Number of extraction attempts made so far
    #[serde(default)]
    pub attempt: u32,
}

impl UrlRecord {
    /// A record for a URL that has not been attempted yet
    pub fn new() -> Self {
        Self::default()
    }

    /// A record for a contact page discovered during a pass
    pub fn discovered() -> Self {
        Self {
            attempt: 1,
            ..Self::default()
        }
    }

    /// Re-seeds a record for a new pass
    ///
    /// The attempt count and discovered links survive; the previous error does not.
    pub fn reseed(previous: Option<&UrlRecord>) -> Self {
        match previous {
            Some(prev) => Self {
                info: None,
                other_urls: prev.other_urls.clone(),
                err: None,
                err_code: None,
                err_kind: None,
                attempt: prev.attempt,
            },
            None => Self::new(),
        }
    }

    /// Returns true once a profile has been extracted
    pub fn is_resolved(&self) -> bool {
        self.info.is_some()
    }

    /// Records an outcome, or clears the error fields when `None`
    pub fn set_outcome(&mut self, outcome: Option<&Outcome>) {
        match outcome {
            Some(outcome) => {
                self.err = Some(outcome.message.clone());
                self.err_code = Some(outcome.code);
                self.err_kind = Some(outcome.kind);
            }
            None => {
                self.err = None;
                self.err_code = None;
                self.err_kind = None;
            }
        }
    }
}
