//! Browser abstraction used by the crawler
//!
//! The crawler never talks to a browser directly. It is written against three
//! capabilities:
//! - [`BrowserEngine`] launches a browser, optionally through a proxy
//! - [`BrowserHandle`] opens pages and shuts the browser down
//! - [`PageHandle`] navigates, waits, reads the DOM and closes
//!
//! [`chrome::ChromeEngine`] implements them on top of `chromiumoxide`.
//! Failures are reported as [`BrowserError`] and classified further up.

pub mod chrome;

pub use chrome::ChromeEngine;

use crate::config::ProxyCredentials;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Substrings in browser error text that mean the browser process or its
/// DevTools connection is gone.
pub const CONNECTION_LOST_MARKERS: &[&str] = &[
    "websocket closed",
    "1006",
    "econnrefused",
    "connection reset",
    "connection closed",
    "socket hang up",
    "receiver is gone",
    "channel closed",
    "broken pipe",
];

/// Errors raised by a browser backend
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Run out of proxies: index {requested} requested, {available} configured")]
    ProxyExhausted { requested: usize, available: usize },

    #[error("{operation} timed out after {elapsed:?}")]
    Timeout { operation: String, elapsed: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Browser connection lost: {0}")]
    Connection(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Browser protocol error: {0}")]
    Protocol(String),
}

impl BrowserError {
    /// Builds a timeout error for the named operation
    pub fn timeout(operation: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed,
        }
    }

    /// Maps raw backend error text, recognising timeouts and lost connections
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("timed out") || lower.contains("timeout") {
            Self::Timeout {
                operation: message,
                elapsed: Duration::ZERO,
            }
        } else if CONNECTION_LOST_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::Connection(message)
        } else {
            Self::Protocol(message)
        }
    }
}

/// Request interception settings applied to a new page
#[derive(Debug, Clone, Default)]
pub struct InterceptPolicy {
    /// Resource types to abort (lowercase DevTools names, e.g. "image")
    pub blocked: Vec<String>,

    /// Credentials answered to proxy authentication challenges
    pub credentials: Option<ProxyCredentials>,
}

impl InterceptPolicy {
    pub fn is_passthrough(&self) -> bool {
        self.blocked.is_empty() && self.credentials.is_none()
    }

    /// Returns true if requests of this resource type are aborted
    pub fn blocks(&self, resource_type: &str) -> bool {
        self.blocked
            .iter()
            .any(|b| b.eq_ignore_ascii_case(resource_type))
    }
}

/// Launches browser instances
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    type Browser: BrowserHandle;

    /// Starts a new browser, routing traffic through `proxy` when given
    async fn launch(&self, proxy: Option<&str>) -> Result<Self::Browser, BrowserError>;
}

/// A running browser instance
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    type Page: PageHandle;

    /// Opens a blank page
    async fn new_page(&self) -> Result<Self::Page, BrowserError>;

    /// Shuts the browser down; calling it again is a no-op
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// A single browser tab
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Sets the timeout used for operations that take none explicitly
    fn set_default_timeout(&mut self, timeout: Duration);

    async fn set_user_agent(&self, user_agent: &str) -> Result<(), BrowserError>;

    /// Enables request interception with the given policy
    async fn intercept_requests(&mut self, policy: InterceptPolicy) -> Result<(), BrowserError>;

    /// Navigates to `url` and returns the main document status, if one was seen
    async fn goto(&self, url: &str, timeout: Duration) -> Result<Option<u16>, BrowserError>;

    /// Waits until no request has been issued for `idle`
    async fn wait_for_network_idle(
        &self,
        idle: Duration,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), BrowserError>;

    /// Evaluates a JavaScript expression and returns its JSON value
    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value, BrowserError>;

    /// Returns the serialized DOM of the current document
    async fn content(&self) -> Result<String, BrowserError>;

    async fn close(self) -> Result<(), BrowserError>;
}
