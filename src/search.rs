//! Web-search fallback
//!
//! When a scan is a company name rather than a URL, the configured
//! custom-search endpoint is queried and the result links become the batch.

use crate::config::{SearchConfig, DEFAULT_USER_AGENT};
use crate::url::{is_crawlable_url, MAX_QUERY_LEN};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Search-specific errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search is not configured (missing API key or engine id)")]
    NotConfigured,

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Search endpoint returned HTTP {0}")]
    Status(u16),
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

/// Client for a custom-search JSON API
pub struct SearchClient {
    client: Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
    max_results: u32,
}

impl SearchClient {
    /// Builds a client from the search settings
    ///
    /// # Returns
    ///
    /// * `Ok(SearchClient)` - Ready to query
    /// * `Err(SearchError::NotConfigured)` - Key or engine id missing
    /// * `Err(SearchError::Request)` - The HTTP client could not be built
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        let (api_key, engine_id) = match (&config.api_key, &config.engine_id) {
            (Some(key), Some(id)) if !key.is_empty() && !id.is_empty() => {
                (key.clone(), id.clone())
            }
            _ => return Err(SearchError::NotConfigured),
        };

        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            engine_id,
            max_results: config.max_results,
        })
    }

    /// Runs a search
    ///
    /// # Arguments
    ///
    /// * `query` - Free text, 1 to 100 characters
    ///
    /// # Returns
    ///
    /// The hits in ranking order; an empty list when nothing matched
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let query = query.trim();
        let len = query.chars().count();
        if len == 0 || len > MAX_QUERY_LEN {
            return Err(SearchError::InvalidQuery(format!(
                "expected 1 to {} characters, got {}",
                MAX_QUERY_LEN, len
            )));
        }

        let num = self.max_results.to_string();
        tracing::info!("Searching for '{}'", query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Search for '{}' failed with HTTP {}", query, status.as_u16());
            return Err(SearchError::Status(status.as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        tracing::debug!("Search for '{}' returned {} hit(s)", query, body.items.len());
        Ok(body.items)
    }

    /// Runs a search and keeps the crawlable result links
    pub async fn search_targets(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let mut targets: Vec<String> = Vec::new();
        for hit in self.search(query).await? {
            if is_crawlable_url(&hit.link) && !targets.contains(&hit.link) {
                targets.push(hit.link);
            }
        }
        Ok(targets)
    }
}
