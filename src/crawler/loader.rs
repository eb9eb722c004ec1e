//! Page loading
//!
//! This module navigates a page and decides whether it is fit for extraction:
//! - Navigation with in-place retries for transient failures
//! - Status code classification
//! - Settling (network idle, with a root element fallback)
//! - CAPTCHA / anti-bot detection

use crate::browser::{BrowserError, PageHandle};
use crate::config::Config;
use crate::crawler::classify::classify;
use crate::crawler::outcome::Outcome;
use scraper::{Html, Selector};
use std::time::Duration;

const CAPTCHA_SELECTORS: &[&str] = &[
    r#"iframe[src*="captcha"]"#,
    r#"div[id*="g-recaptcha"]"#,
    r#"div[class*="h-captcha"]"#,
    ".cf-browser-verification",
    "#bot-detection-page",
];

const CAPTCHA_PHRASES: &[&str] = &["verify you're human", "Please complete the security check"];

/// Result of a load attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResult {
    /// The page loaded and can be extracted, possibly with a warning
    Ready { warning: Option<Outcome> },

    /// The page could not be loaded
    Failed(Outcome),
}

/// Loads a URL into a page, ready for extraction
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 404 | Immediate → invalid page |
/// | HTTP 403 / 429 | Immediate → proxy issue |
/// | HTTP 5xx | Retry up to `max-navigation-retries` times, backoff between |
/// | Navigation error | Retry up to `max-navigation-retries` times, no delay |
/// | Anything else | Accepted |
///
/// Once loaded, the page is given time to settle. Settling never fails a
/// load. A CAPTCHA on the settled page yields `Ready` with a 422 warning.
///
/// # Arguments
///
/// * `page` - The page to navigate
/// * `url` - The URL to load
/// * `config` - Timeouts and retry ceilings
///
/// # Returns
///
/// A LoadResult indicating readiness or the classified failure
pub async fn load_page<P: PageHandle>(page: &P, url: &str, config: &Config) -> LoadResult {
    let max_retries = config.retry.max_navigation_retries;
    let mut retries = 0;

    loop {
        match page.goto(url, config.browser.navigation_timeout()).await {
            Ok(Some(404)) => {
                tracing::warn!("{} returned 404", url);
                return LoadResult::Failed(classify(&BrowserError::HttpStatus {
                    status: 404,
                    message: "Invalid Page URL".to_string(),
                }));
            }
            Ok(Some(status @ (403 | 429))) => {
                tracing::warn!("{} returned {}", url, status);
                return LoadResult::Failed(classify(&BrowserError::HttpStatus {
                    status,
                    message: "Proxy / Authentication Issue".to_string(),
                }));
            }
            Ok(Some(status)) if status >= 500 => {
                if retries < max_retries {
                    retries += 1;
                    tracing::debug!(
                        "{} returned {}, retry {}/{}",
                        url,
                        status,
                        retries,
                        max_retries
                    );
                    pause(config.retry.server_error_backoff()).await;
                    continue;
                }
                tracing::warn!("{} still returning {} after {} retries", url, status, retries);
                return LoadResult::Failed(classify(&BrowserError::HttpStatus {
                    status,
                    message: "Internal Server Error".to_string(),
                }));
            }
            Ok(status) => {
                tracing::debug!("Loaded {} (status {:?})", url, status);
                break;
            }
            Err(e) => {
                if retries < max_retries {
                    retries += 1;
                    tracing::debug!(
                        "Navigation to {} failed ({}), retry {}/{}",
                        url,
                        e,
                        retries,
                        max_retries
                    );
                    continue;
                }
                tracing::warn!("Navigation to {} failed after {} retries: {}", url, retries, e);
                return LoadResult::Failed(classify(&e));
            }
        }
    }

    settle(page, url, config).await;

    if has_captcha(page).await {
        tracing::warn!("CAPTCHA/anti-bot challenge on {}", url);
        return LoadResult::Ready {
            warning: Some(Outcome::captcha()),
        };
    }

    LoadResult::Ready { warning: None }
}

/// Waits for network idle, falling back to the root element
async fn settle<P: PageHandle>(page: &P, url: &str, config: &Config) {
    let idle = page
        .wait_for_network_idle(
            config.browser.network_idle(),
            config.browser.network_idle_timeout(),
        )
        .await;

    if let Err(e) = idle {
        tracing::debug!("Network never idled on {} ({}), waiting for body", url, e);
        let fallback = config.browser.selector_fallback_timeout();
        if let Err(e) = page.wait_for_selector("body", fallback).await {
            tracing::warn!("No body on {} after {:?}: {}", url, fallback, e);
        }
    }
}

/// Checks a settled page for CAPTCHA widgets or challenge text
///
/// Read failures count as "no CAPTCHA".
async fn has_captcha<P: PageHandle>(page: &P) -> bool {
    match page.content().await {
        Ok(html) => {
            if let Some(selector) = matching_captcha_selector(&html) {
                tracing::debug!("CAPTCHA element found: {}", selector);
                return true;
            }
        }
        Err(e) => {
            tracing::debug!("Could not read page for CAPTCHA check: {}", e);
            return false;
        }
    }

    match page.evaluate("document.body ? document.body.innerText : ''").await {
        Ok(value) => value.as_str().is_some_and(has_captcha_phrase),
        Err(e) => {
            tracing::debug!("Could not read page text for CAPTCHA check: {}", e);
            false
        }
    }
}

fn matching_captcha_selector(html: &str) -> Option<&'static str> {
    let document = Html::parse_document(html);
    CAPTCHA_SELECTORS.iter().copied().find(|css| {
        Selector::parse(css)
            .map(|sel| document.select(&sel).next().is_some())
            .unwrap_or(false)
    })
}

fn has_captcha_phrase(text: &str) -> bool {
    CAPTCHA_PHRASES.iter().any(|p| text.contains(p))
}

/// Sleeps for `duration`; zero durations return immediately
pub(crate) async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
