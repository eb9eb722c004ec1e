//! Integration tests for Sitescout
//!
//! The coordinator is driven end to end by a scripted in-memory browser; the
//! search fallback is exercised against a wiremock server.

mod coordinator_tests;
mod fake;
mod search_tests;
