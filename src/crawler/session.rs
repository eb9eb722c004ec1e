//! Browser sessions and page preparation

use crate::browser::{BrowserEngine, BrowserError, BrowserHandle, InterceptPolicy, PageHandle};
use crate::config::Config;
use crate::crawler::classify::classify;
use crate::crawler::outcome::Outcome;
use std::sync::Arc;

/// A browser launched for one pass of a batch
///
/// Closing is idempotent. A session dropped without being closed still
/// releases its browser through the backend's own drop logic.
pub struct Session<B: BrowserHandle> {
    browser: B,
    proxy_index: Option<usize>,
    closed: bool,
}

impl<B: BrowserHandle> Session<B> {
    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn proxy_index(&self) -> Option<usize> {
        self.proxy_index
    }

    /// Shuts the browser down; later calls do nothing
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.browser.close().await {
            tracing::warn!("Browser did not close cleanly: {}", e);
        }
    }
}

/// Launches browsers and opens configured pages
pub struct SessionManager<E: BrowserEngine> {
    engine: E,
    config: Arc<Config>,
}

impl<E: BrowserEngine> SessionManager<E> {
    pub fn new(engine: E, config: Arc<Config>) -> Self {
        Self { engine, config }
    }

    /// Launches a browser, through the proxy at `proxy_index` if given
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - The running browser
    /// * `Err(BrowserError::ProxyExhausted)` - `proxy_index` is past the end of the proxy list
    /// * `Err(BrowserError)` - The backend failed to launch
    pub async fn launch(
        &self,
        proxy_index: Option<usize>,
    ) -> Result<Session<E::Browser>, BrowserError> {
        let proxy = match proxy_index {
            Some(index) => {
                let available = self.config.proxy.servers.len();
                let endpoint = self.config.proxy.endpoint(index).ok_or(
                    BrowserError::ProxyExhausted {
                        requested: index,
                        available,
                    },
                )?;
                tracing::info!("Launching browser via proxy {} of {}", index + 1, available);
                Some(endpoint)
            }
            None => {
                tracing::info!("Launching browser without proxy");
                None
            }
        };

        let browser = self.engine.launch(proxy).await?;

        Ok(Session {
            browser,
            proxy_index,
            closed: false,
        })
    }

    /// Opens a page ready for navigation
    ///
    /// The page gets the default timeout, the configured user agent and
    /// request interception (blocked resource types, plus proxy credentials
    /// when a proxy is in use). Failures are retried up to
    /// `max-page-create-retries` times before being classified.
    pub async fn new_page<B: BrowserHandle>(
        &self,
        browser: &B,
        proxy_index: Option<usize>,
    ) -> Result<B::Page, Outcome> {
        let max_retries = self.config.retry.max_page_create_retries;
        let mut retries = 0;

        loop {
            match self.open_configured_page(browser, proxy_index).await {
                Ok(page) => return Ok(page),
                Err(e) if retries < max_retries => {
                    retries += 1;
                    tracing::warn!(
                        "Page creation failed ({}), retry {}/{}",
                        e,
                        retries,
                        max_retries
                    );
                }
                Err(e) => {
                    tracing::error!("Page creation failed after {} retries: {}", retries, e);
                    return Err(classify(&e));
                }
            }
        }
    }

    async fn open_configured_page<B: BrowserHandle>(
        &self,
        browser: &B,
        proxy_index: Option<usize>,
    ) -> Result<B::Page, BrowserError> {
        let mut page = browser.new_page().await?;
        page.set_default_timeout(self.config.browser.default_timeout());

        let policy = InterceptPolicy {
            blocked: self.config.browser.blocked_resources.clone(),
            credentials: proxy_index.and_then(|_| self.config.proxy.credentials()),
        };

        let prepared = async {
            page.set_user_agent(&self.config.browser.user_agent).await?;
            page.intercept_requests(policy).await
        }
        .await;

        match prepared {
            Ok(()) => Ok(page),
            Err(e) => {
                if let Err(close_err) = page.close().await {
                    tracing::debug!("Could not close half-configured page: {}", close_err);
                }
                Err(e)
            }
        }
    }
}
