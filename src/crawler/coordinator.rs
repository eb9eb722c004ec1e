//! Batch coordinator - retry and escalation logic
//!
//! A batch is processed in passes. Each pass runs on one browser and walks the
//! URLs that still need work, one at a time. At the end of a pass the
//! escalation flags raised by its pages decide what happens next:
//! - a proxy change starts a new pass through the next proxy
//! - a browser relaunch starts a new pass with a fresh browser, same proxy
//! - otherwise the batch is done
//!
//! Passes are bounded by `max-batch-retries`; individual URLs by
//! `max-url-attempts`.

use crate::browser::{BrowserEngine, PageHandle};
use crate::config::Config;
use crate::crawler::classify::classify;
use crate::crawler::loader::pause;
use crate::crawler::outcome::{Escalation, Outcome};
use crate::crawler::processor::{extract_into, process_url, PassContext};
use crate::crawler::session::SessionManager;
use crate::extract::{Extractor, HtmlExtractor};
use crate::state::{ResultMap, RetryContext, UrlRecord};
use std::sync::Arc;

/// Why a URL is in a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Requested by the caller; may trigger a contact crawl
    Target,
    /// Contact page found by an earlier pass; extracted only
    Contact,
}

/// What a single pass produced
struct PassReport {
    results: ResultMap,
    escalation: Escalation,
}

/// Main batch coordinator structure
pub struct Coordinator<E: BrowserEngine, X: Extractor = HtmlExtractor> {
    config: Arc<Config>,
    sessions: SessionManager<E>,
    extractor: X,
}

impl<E: BrowserEngine> Coordinator<E, HtmlExtractor> {
    /// Creates a coordinator using the heuristic HTML extractor
    pub fn new(engine: E, config: Arc<Config>) -> Self {
        Self::with_extractor(engine, config, HtmlExtractor::new())
    }
}

impl<E: BrowserEngine, X: Extractor> Coordinator<E, X> {
    /// Creates a coordinator with a custom extractor
    pub fn with_extractor(engine: E, config: Arc<Config>, extractor: X) -> Self {
        Self {
            sessions: SessionManager::new(engine, Arc::clone(&config)),
            config,
            extractor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Processes a batch of URLs
    ///
    /// # Arguments
    ///
    /// * `urls` - The target URLs
    ///
    /// # Returns
    ///
    /// A record for every URL that was attempted, plus any contact pages
    /// crawled along the way. Failures are recorded, never returned.
    pub async fn process_batch(&self, urls: &[String]) -> ResultMap {
        self.process_batch_with(urls, ResultMap::new(), None).await
    }

    /// Processes a batch on top of earlier results, optionally on a caller's browser
    ///
    /// URLs already resolved in `previous` are not visited again. A supplied
    /// browser is used for the first pass only and is never closed here;
    /// escalated passes launch their own.
    pub async fn process_batch_with(
        &self,
        urls: &[String],
        previous: ResultMap,
        browser: Option<&E::Browser>,
    ) -> ResultMap {
        let retry = &self.config.retry;
        let mut accumulator = previous;
        let mut ctx = RetryContext::initial();
        let mut supplied = browser;

        loop {
            if ctx.exceeds(retry.max_batch_retries) {
                let marked = accumulator.fail_unresolved(&Outcome::internal_error());
                tracing::warn!(
                    "Retry ceiling reached after {} passes, {} URL(s) left unresolved",
                    ctx.retry_attempt,
                    marked
                );
                break;
            }

            let pending = self.pending_urls(urls, &accumulator);
            if pending.is_empty() {
                tracing::debug!("Nothing left to process");
                break;
            }

            if ctx.retry_attempt > 0 {
                pause(retry.escalation_pause()).await;
            }

            tracing::info!(
                "Pass {} over {} URL(s) ({})",
                ctx.retry_attempt + 1,
                pending.len(),
                ctx.proxy_index
                    .map(|i| format!("proxy {}", i + 1))
                    .unwrap_or_else(|| "direct".to_string())
            );

            let report = match supplied.take() {
                Some(browser) => {
                    self.run_pass(browser, ctx.proxy_index, &pending, &accumulator)
                        .await
                }
                None => self.run_launched_pass(ctx.proxy_index, &pending, &accumulator).await,
            };

            accumulator.merge(report.results);

            let escalation = report.escalation;
            if escalation.proxy_change {
                match ctx.rotate_proxy(self.config.proxy.servers.len()) {
                    Some(next) => {
                        tracing::info!(
                            "Switching to proxy {} of {}",
                            next.proxy_index.map_or(0, |i| i + 1),
                            self.config.proxy.servers.len()
                        );
                        ctx = next;
                    }
                    None => {
                        tracing::error!(
                            "Run out of proxies: {} configured, none left to try",
                            self.config.proxy.servers.len()
                        );
                        break;
                    }
                }
            } else if escalation.relaunch_browser {
                tracing::info!("Relaunching browser");
                ctx = ctx.relaunch();
            } else {
                break;
            }
        }

        accumulator
    }

    /// URLs that still need an attempt, in input order without duplicates
    ///
    /// Contact pages discovered by earlier passes that are still unresolved
    /// follow the caller's URLs, so an escalation they raised gets its retry.
    fn pending_urls(&self, urls: &[String], accumulator: &ResultMap) -> Vec<(String, Role)> {
        let max_attempts = self.config.retry.max_url_attempts;
        let mut pending: Vec<(String, Role)> = Vec::new();

        for url in urls {
            if pending.iter().any(|(u, _)| u == url) {
                continue;
            }
            match accumulator.get(url) {
                Some(record) if record.is_resolved() => {}
                Some(record) if record.attempt >= max_attempts => {
                    tracing::debug!("{} used all {} attempts", url, max_attempts);
                }
                _ => pending.push((url.clone(), Role::Target)),
            }
        }

        for (_, parent) in accumulator.iter() {
            for link in &parent.other_urls {
                if urls.contains(link) || pending.iter().any(|(u, _)| u == link) {
                    continue;
                }
                if let Some(record) = accumulator.get(link) {
                    if !record.is_resolved() && record.attempt < max_attempts {
                        pending.push((link.clone(), Role::Contact));
                    }
                }
            }
        }

        pending
    }

    /// Runs a pass on a browser launched for it, closing the browser afterwards
    async fn run_launched_pass(
        &self,
        proxy_index: Option<usize>,
        pending: &[(String, Role)],
        accumulator: &ResultMap,
    ) -> PassReport {
        match self.sessions.launch(proxy_index).await {
            Ok(mut session) => {
                let report = self
                    .run_pass(session.browser(), proxy_index, pending, accumulator)
                    .await;
                session.close().await;
                report
            }
            Err(e) => {
                tracing::error!("Browser launch failed: {}", e);
                let outcome = classify(&e);
                let mut results = seed_pass(pending, accumulator);
                for (url, _) in pending {
                    results.record_mut(url).set_outcome(Some(&outcome));
                }

                // Only a proxy that can actually be replaced is worth another pass
                PassReport {
                    results,
                    escalation: Escalation {
                        proxy_change: outcome.requires_new_proxy,
                        relaunch_browser: false,
                    },
                }
            }
        }
    }

    /// Processes every pending URL on `browser`, one at a time
    async fn run_pass(
        &self,
        browser: &E::Browser,
        proxy_index: Option<usize>,
        pending: &[(String, Role)],
        accumulator: &ResultMap,
    ) -> PassReport {
        let ctx = PassContext {
            config: &self.config,
            sessions: &self.sessions,
            browser,
            proxy_index,
            extractor: &self.extractor,
            known: accumulator,
        };

        let mut results = seed_pass(pending, accumulator);
        let mut escalation = Escalation::default();

        for (url, role) in pending {
            let page = match self.sessions.new_page(browser, proxy_index).await {
                Ok(page) => page,
                Err(outcome) => {
                    tracing::warn!("No page for {}: {}", url, outcome);
                    results.record_mut(url).set_outcome(Some(&outcome));
                    escalation.absorb(&outcome);
                    continue;
                }
            };

            let report = match role {
                Role::Target => process_url(&ctx, &page, url, &mut results).await,
                Role::Contact => {
                    extract_into(
                        &self.config,
                        &self.extractor,
                        &page,
                        url,
                        results.record_mut(url),
                    )
                    .await
                }
            };
            escalation.merge(report.escalation);

            if let Err(e) = page.close().await {
                tracing::debug!("Page for {} did not close cleanly: {}", url, e);
            }
        }

        PassReport {
            results,
            escalation,
        }
    }
}

/// Fresh records for a pass, carrying attempt counts over from earlier passes
fn seed_pass(pending: &[(String, Role)], accumulator: &ResultMap) -> ResultMap {
    let mut results = ResultMap::new();
    for (url, _) in pending {
        results.insert(url.clone(), UrlRecord::reseed(accumulator.get(url)));
    }
    results
}
