//! Maps browser failures to outcomes
//!
//! # Rules (first match wins)
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | HTTP 403 / 429 | proxy issue, new proxy |
//! | HTTP 5xx | internal error |
//! | Other HTTP status | invalid page |
//! | Timeout | internal error |
//! | DNS resolution failure | internal error |
//! | Captcha / bot policy | internal error |
//! | Lost browser connection | internal error, relaunch |
//! | Proxy refused the tunnel | proxy issue, new proxy |
//! | Proxy list exhausted | proxy exhausted |
//! | Anything else | internal error |

use super::outcome::Outcome;
use crate::browser::{BrowserError, CONNECTION_LOST_MARKERS};

const DNS_MARKERS: &[&str] = &["err_name_not_resolved", "err_dns", "name not resolved"];

const CAPTCHA_MARKERS: &[&str] = &["captcha", "bot policy"];

const PROXY_MARKERS: &[&str] = &[
    "err_no_supported_proxies",
    "err_proxy_connection_failed",
    "err_tunnel_connection_failed",
    "err_proxy_auth",
];

/// Classifies a browser failure
///
/// # Arguments
///
/// * `error` - The error raised while launching, opening or loading a page
///
/// # Returns
///
/// The outcome to record and the escalation it requests
pub fn classify(error: &BrowserError) -> Outcome {
    let message = match error {
        BrowserError::HttpStatus { status, .. } => return classify_status(*status),
        BrowserError::ProxyExhausted {
            requested,
            available,
        } => {
            tracing::error!(
                "Proxy index {} requested but only {} configured",
                requested,
                available
            );
            return Outcome::proxy_exhausted();
        }
        BrowserError::Timeout { operation, .. } => {
            tracing::warn!("Timeout: {}", operation);
            return Outcome::timeout();
        }
        BrowserError::Connection(message) => {
            tracing::error!("Browser connection lost: {}", message);
            return Outcome::browser_crash();
        }
        BrowserError::Navigation { message, .. }
        | BrowserError::Launch(message)
        | BrowserError::Protocol(message) => message.to_lowercase(),
    };

    if message.contains("err_timed_out") || message.contains("timed out") {
        tracing::warn!("Timeout: {}", message);
        Outcome::timeout()
    } else if contains_any(&message, DNS_MARKERS) {
        tracing::warn!("DNS resolution failed: {}", message);
        Outcome::internal_error()
    } else if contains_any(&message, CAPTCHA_MARKERS) {
        tracing::warn!("Blocked by captcha or bot policy: {}", message);
        Outcome::captcha_blocked()
    } else if contains_any(&message, CONNECTION_LOST_MARKERS) {
        tracing::error!("Browser connection lost: {}", message);
        Outcome::browser_crash()
    } else if contains_any(&message, PROXY_MARKERS) {
        tracing::warn!("Proxy failure: {}", message);
        Outcome::proxy_issue()
    } else {
        tracing::error!("Unexpected browser error: {}", message);
        Outcome::internal_error()
    }
}

/// Classifies a main document HTTP status
pub fn classify_status(status: u16) -> Outcome {
    match status {
        403 | 429 => {
            tracing::warn!("HTTP {}: proxy or authentication issue", status);
            Outcome::proxy_issue()
        }
        s if s >= 500 => {
            tracing::warn!("HTTP {}: server error", status);
            Outcome::internal_error()
        }
        _ => {
            tracing::debug!("HTTP {}: invalid page", status);
            Outcome::invalid_page()
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
