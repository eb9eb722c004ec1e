//! Extraction orchestration
//!
//! This module contains the core crawling logic, including:
//! - Failure classification and escalation signals
//! - Browser sessions and page preparation
//! - Page loading with in-place retries and CAPTCHA detection
//! - Per-page extraction and the contact page crawl
//! - Batch coordination across escalated passes

mod classify;
mod contact;
mod coordinator;
mod loader;
mod outcome;
mod parser;
mod processor;
mod session;

pub use classify::{classify, classify_status};
pub use contact::crawl_contacts;
pub use coordinator::Coordinator;
pub use loader::{load_page, LoadResult};
pub use outcome::{
    ErrorKind, Escalation, Outcome, CAPTCHA_WARNING, INTERNAL_SERVER_ERROR, INVALID_PAGE,
    PROXY_EXHAUSTED, PROXY_ISSUE,
};
pub use parser::extract_contact_links;
pub use processor::{extract_into, process_url, PageReport, PassContext};
pub use session::{Session, SessionManager};
