//! Company profile extraction
//!
//! This module turns a loaded page into a [`CompanyInfo`]. The heuristics run
//! over the serialized DOM, so a page is read from the browser once and parsed
//! locally:
//! - `contacts`: addresses, emails, phone numbers, social links
//! - `profile`: names, taglines, descriptions, offerings, industries,
//!   founding year, operational status

mod contacts;
mod profile;

use crate::browser::{BrowserError, PageHandle};
use async_trait::async_trait;
use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Profile extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub addresses: Vec<String>,
    pub social_media: SocialLinks,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub company_names: Vec<String>,
    pub taglines: Vec<String>,
    pub descriptions: Vec<String>,
    pub products_services: Vec<String>,
    pub industries: Vec<String>,
    pub year_founded: Option<i32>,
    pub operational_status: OperationalStatus,
}

impl CompanyInfo {
    /// Returns true when any contact channel is missing
    ///
    /// Incomplete pages are worth a follow-up crawl of the site's contact pages.
    pub fn is_incomplete(&self) -> bool {
        self.addresses.is_empty() || self.emails.is_empty() || self.phone_numbers.is_empty()
    }
}

/// First profile link found per network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reddit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLabel {
    Active,
    Inactive,
    Maintenance,
    #[default]
    Uncertain,
}

/// Whether the business looks alive, with the evidence used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalStatus {
    pub status: StatusLabel,
    pub confidence: f64,
    pub indicators: Vec<String>,
}

impl Default for OperationalStatus {
    fn default() -> Self {
        Self {
            status: StatusLabel::Uncertain,
            confidence: 50.0,
            indicators: Vec::new(),
        }
    }
}

/// Pulls a company profile out of a loaded page
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract_all<P: PageHandle>(&self, page: &P) -> Result<CompanyInfo, BrowserError>;
}

/// Heuristic extractor working on the page's serialized DOM
#[derive(Debug, Clone, Default)]
pub struct HtmlExtractor {
    reference_year: Option<i32>,
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins "the current year" used by date heuristics
    pub fn with_reference_year(year: i32) -> Self {
        Self {
            reference_year: Some(year),
        }
    }

    fn current_year(&self) -> i32 {
        self.reference_year
            .unwrap_or_else(|| chrono::Utc::now().year())
    }

    /// Runs every heuristic over an HTML document
    pub fn extract_html(&self, html: &str) -> CompanyInfo {
        let doc = PageDocument::parse(html);
        let year = self.current_year();

        CompanyInfo {
            addresses: contacts::addresses(&doc),
            social_media: contacts::social_links(&doc),
            emails: contacts::emails(&doc),
            phone_numbers: contacts::phone_numbers(&doc),
            company_names: profile::company_names(&doc),
            taglines: profile::taglines(&doc),
            descriptions: profile::descriptions(&doc),
            products_services: profile::products_services(&doc),
            industries: profile::industries(&doc),
            year_founded: profile::year_founded(&doc, year),
            operational_status: profile::operational_status(&doc, year),
        }
    }
}

#[async_trait]
impl Extractor for HtmlExtractor {
    async fn extract_all<P: PageHandle>(&self, page: &P) -> Result<CompanyInfo, BrowserError> {
        let html = page.content().await?;
        Ok(self.extract_html(&html))
    }
}

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A parsed page plus its visible body text
pub(crate) struct PageDocument {
    html: Html,
    body_text: String,
}

impl PageDocument {
    pub(crate) fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let body_text = match Selector::parse("body") {
            Ok(sel) => html
                .select(&sel)
                .next()
                .map(visible_text)
                .unwrap_or_default(),
            Err(_) => String::new(),
        };
        Self { html, body_text }
    }

    pub(crate) fn body_text(&self) -> &str {
        &self.body_text
    }

    /// Elements matching any of the CSS selectors, in selector order
    pub(crate) fn select_all<'a>(&'a self, selectors: &[&str]) -> Vec<ElementRef<'a>> {
        let mut found = Vec::new();
        for css in selectors {
            if let Ok(sel) = Selector::parse(css) {
                found.extend(self.html.select(&sel));
            }
        }
        found
    }

    /// Collapsed text of every element matching the selectors
    pub(crate) fn texts(&self, selectors: &[&str]) -> Vec<String> {
        self.select_all(selectors)
            .into_iter()
            .map(visible_text)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Value of `attr` on the first element matching `css`
    pub(crate) fn attr(&self, css: &str, attr: &str) -> Option<String> {
        let sel = Selector::parse(css).ok()?;
        self.html
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr(attr))
            .map(|v| v.trim().to_string())
    }

    pub(crate) fn title(&self) -> Option<String> {
        let sel = Selector::parse("title").ok()?;
        self.html
            .select(&sel)
            .next()
            .map(visible_text)
            .filter(|t| !t.is_empty())
    }

    /// Parsed bodies of every JSON-LD script block
    pub(crate) fn json_ld(&self) -> Vec<serde_json::Value> {
        self.select_all(&[r#"script[type="application/ld+json"]"#])
            .into_iter()
            .filter_map(|el| {
                let raw: String = el.text().collect();
                serde_json::from_str(&raw).ok()
            })
            .collect()
    }

    /// Text blocks from elements that hold little markup, for pattern scans
    pub(crate) fn text_blocks(&self) -> Vec<String> {
        let mut blocks = Vec::new();
        for el in self.select_all(&["p", "li", "address", "span", "td", "small", "div", "footer"]) {
            if el.children().filter(|c| c.value().is_element()).count() > 3 {
                continue;
            }
            let text = visible_text(el);
            if !text.is_empty() && !blocks.contains(&text) {
                blocks.push(text);
            }
        }
        blocks
    }
}

/// Text content of an element, skipping scripts and styles, whitespace collapsed
pub(crate) fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name()))
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Appends `value` unless it is already present
pub(crate) fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Returns true if `len` characters falls within `min..=max`
pub(crate) fn char_len_between(text: &str, min: usize, max: usize) -> bool {
    let len = text.chars().count();
    len >= min && len <= max
}
