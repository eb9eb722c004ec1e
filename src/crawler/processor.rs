//! Per-page processing: load, extract, record

use crate::browser::{BrowserEngine, BrowserHandle, PageHandle};
use crate::config::Config;
use crate::crawler::classify::classify;
use crate::crawler::contact::crawl_contacts;
use crate::crawler::loader::{load_page, LoadResult};
use crate::crawler::outcome::{Escalation, Outcome};
use crate::crawler::session::SessionManager;
use crate::extract::Extractor;
use crate::state::{ResultMap, UrlRecord};

/// Everything a pass needs to process pages
pub struct PassContext<'a, E: BrowserEngine, X: Extractor> {
    pub config: &'a Config,
    pub sessions: &'a SessionManager<E>,
    pub browser: &'a E::Browser,
    pub proxy_index: Option<usize>,
    pub extractor: &'a X,
    /// Results accumulated by earlier passes
    pub known: &'a ResultMap,
}

/// What happened to one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReport {
    /// The failure or warning recorded, if any
    pub outcome: Option<Outcome>,
    pub escalation: Escalation,
}

impl PageReport {
    pub fn from_outcome(outcome: Option<Outcome>) -> Self {
        let mut escalation = Escalation::default();
        if let Some(outcome) = &outcome {
            escalation.absorb(outcome);
        }
        Self {
            outcome,
            escalation,
        }
    }
}

/// Processes a target URL on an open page
///
/// Loads and extracts the page into its record, then crawls the site's
/// contact pages when the profile is missing a contact channel.
///
/// # Arguments
///
/// * `ctx` - The pass this page belongs to
/// * `page` - A fresh page owned by the caller
/// * `url` - The target URL
/// * `results` - The pass's result map; must already hold a record for `url`
///
/// # Returns
///
/// The page's own outcome and the escalation requested by it or its contact pages
pub async fn process_url<E, X>(
    ctx: &PassContext<'_, E, X>,
    page: &<E::Browser as BrowserHandle>::Page,
    url: &str,
    results: &mut ResultMap,
) -> PageReport
where
    E: BrowserEngine,
    X: Extractor,
{
    let record = results.record_mut(url);
    let mut report = extract_into(ctx.config, ctx.extractor, page, url, record).await;

    let incomplete = results
        .get(url)
        .and_then(|r| r.info.as_ref())
        .is_some_and(|info| info.is_incomplete());

    if incomplete && ctx.config.contact.enabled {
        tracing::debug!("{} is missing contact details, looking for contact pages", url);
        let contact = crawl_contacts(ctx, page, url, results).await;
        report.escalation.merge(contact);
    }

    report
}

/// Loads `url` into `page` and writes the result into `record`
///
/// The attempt counter is bumped whether or not the load succeeds.
pub async fn extract_into<P, X>(
    config: &Config,
    extractor: &X,
    page: &P,
    url: &str,
    record: &mut UrlRecord,
) -> PageReport
where
    P: PageHandle,
    X: Extractor,
{
    let outcome = match load_page(page, url, config).await {
        LoadResult::Ready { warning } => match extractor.extract_all(page).await {
            Ok(info) => {
                tracing::info!(
                    "Extracted {} ({} emails, {} phones, {} addresses)",
                    url,
                    info.emails.len(),
                    info.phone_numbers.len(),
                    info.addresses.len()
                );
                record.info = Some(info);
                warning
            }
            Err(e) => {
                tracing::warn!("Extraction failed on {}: {}", url, e);
                Some(classify(&e))
            }
        },
        LoadResult::Failed(outcome) => {
            tracing::warn!("Could not load {}: {}", url, outcome);
            Some(outcome)
        }
    };

    record.attempt += 1;
    record.set_outcome(outcome.as_ref());

    PageReport::from_outcome(outcome)
}
