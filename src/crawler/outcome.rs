//! Failure outcomes and the escalation signals they carry

use serde::{Deserialize, Serialize};

pub const INVALID_PAGE: &str = "Invalid Page URL";
pub const PROXY_ISSUE: &str = "Issue with proxy";
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";
pub const CAPTCHA_WARNING: &str = "Asking for Captcha some info might be hidden";
pub const PROXY_EXHAUSTED: &str = "Run out of proxies";

/// Broad category of a failed or degraded page visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidPage,
    ProxyIssue,
    BrowserCrash,
    Timeout,
    CaptchaBlocked,
    ProxyExhausted,
    InternalError,
}

/// A classified failure: what to record and how the batch should react
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub kind: ErrorKind,
    pub message: String,
    pub code: u16,
    pub requires_new_proxy: bool,
    pub requires_browser_restart: bool,
}

impl Outcome {
    fn new(kind: ErrorKind, message: &str, code: u16) -> Self {
        Self {
            kind,
            message: message.to_string(),
            code,
            requires_new_proxy: false,
            requires_browser_restart: false,
        }
    }

    pub fn invalid_page() -> Self {
        Self::new(ErrorKind::InvalidPage, INVALID_PAGE, 404)
    }

    /// The proxy (or our address) was refused; retry through another proxy
    pub fn proxy_issue() -> Self {
        Self {
            requires_new_proxy: true,
            ..Self::new(ErrorKind::ProxyIssue, PROXY_ISSUE, 404)
        }
    }

    /// The browser process or its connection died; relaunch it
    pub fn browser_crash() -> Self {
        Self {
            requires_browser_restart: true,
            ..Self::new(ErrorKind::BrowserCrash, INTERNAL_SERVER_ERROR, 500)
        }
    }

    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout, INTERNAL_SERVER_ERROR, 500)
    }

    /// Non-fatal warning: the page loaded but sits behind a challenge
    pub fn captcha() -> Self {
        Self::new(ErrorKind::CaptchaBlocked, CAPTCHA_WARNING, 422)
    }

    /// A navigation failed because the site runs a bot challenge
    pub fn captcha_blocked() -> Self {
        Self::new(ErrorKind::CaptchaBlocked, INTERNAL_SERVER_ERROR, 500)
    }

    pub fn proxy_exhausted() -> Self {
        Self::new(ErrorKind::ProxyExhausted, PROXY_EXHAUSTED, 500)
    }

    pub fn internal_error() -> Self {
        Self::new(ErrorKind::InternalError, INTERNAL_SERVER_ERROR, 500)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// Escalation requests gathered over a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Escalation {
    pub proxy_change: bool,
    pub relaunch_browser: bool,
}

impl Escalation {
    /// Folds the flags carried by an outcome into this set
    pub fn absorb(&mut self, outcome: &Outcome) {
        self.proxy_change |= outcome.requires_new_proxy;
        self.relaunch_browser |= outcome.requires_browser_restart;
    }

    pub fn merge(&mut self, other: Escalation) {
        self.proxy_change |= other.proxy_change;
        self.relaunch_browser |= other.relaunch_browser;
    }

    pub fn is_empty(&self) -> bool {
        !self.proxy_change && !self.relaunch_browser
    }
}
