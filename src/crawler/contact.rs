//! Contact page crawl
//!
//! When a target page is missing a contact channel, the links on it that look
//! like contact pages are processed too, a bounded number at a time. Each
//! contact page gets its own browser page and its own record; results are
//! merged into the pass map once every task has finished.

use crate::browser::{BrowserEngine, BrowserHandle, PageHandle};
use crate::crawler::outcome::Escalation;
use crate::crawler::parser::extract_contact_links;
use crate::crawler::processor::{extract_into, PageReport, PassContext};
use crate::extract::Extractor;
use crate::state::{ResultMap, UrlRecord};
use futures::stream::{self, StreamExt};
use url::Url;

/// Discovers and processes the contact pages linked from `page`
///
/// Discovered links are stored on the parent's record as its other URLs.
/// Links already known to this batch are not visited again. Contact pages
/// are not themselves crawled for further contact pages.
///
/// # Returns
///
/// The escalation requested by any contact page
pub async fn crawl_contacts<E, X>(
    ctx: &PassContext<'_, E, X>,
    page: &<E::Browser as BrowserHandle>::Page,
    url: &str,
    results: &mut ResultMap,
) -> Escalation
where
    E: BrowserEngine,
    X: Extractor,
{
    let html = match page.content().await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!("Could not read {} for contact links: {}", url, e);
            return Escalation::default();
        }
    };

    let base = match Url::parse(url) {
        Ok(base) => base,
        Err(e) => {
            tracing::warn!("Cannot resolve links against {}: {}", url, e);
            return Escalation::default();
        }
    };

    let links = extract_contact_links(&html, &base);
    results.record_mut(url).other_urls = links.clone();

    let targets: Vec<String> = links
        .into_iter()
        .filter(|link| !ctx.known.contains(link) && !results.contains(link))
        .collect();

    if targets.is_empty() {
        tracing::debug!("No new contact pages on {}", url);
        return Escalation::default();
    }

    tracing::info!("Crawling {} contact page(s) from {}", targets.len(), url);

    let finished: Vec<(String, UrlRecord, PageReport)> = stream::iter(targets)
        .map(|target| async move {
            let mut record = UrlRecord::discovered();
            let report = visit_contact_page(ctx, &target, &mut record).await;
            (target, record, report)
        })
        .buffer_unordered(ctx.config.contact.pool_size)
        .collect()
        .await;

    let mut escalation = Escalation::default();
    for (target, record, report) in finished {
        escalation.merge(report.escalation);
        results.insert(target, record);
    }

    escalation
}

async fn visit_contact_page<E, X>(
    ctx: &PassContext<'_, E, X>,
    url: &str,
    record: &mut UrlRecord,
) -> PageReport
where
    E: BrowserEngine,
    X: Extractor,
{
    let page = match ctx.sessions.new_page(ctx.browser, ctx.proxy_index).await {
        Ok(page) => page,
        Err(outcome) => {
            tracing::warn!("No page for contact page {}: {}", url, outcome);
            record.set_outcome(Some(&outcome));
            return PageReport::from_outcome(Some(outcome));
        }
    };

    let report = extract_into(ctx.config, ctx.extractor, &page, url, record).await;

    if let Err(e) = page.close().await {
        tracing::debug!("Contact page {} did not close cleanly: {}", url, e);
    }

    report
}
