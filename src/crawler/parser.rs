//! Contact link discovery
//!
//! This module finds links on a page that probably lead to a contact page.
//! A link qualifies on any one of three signals:
//! - its `href` looks like a contact path (`/contact`, `contact-us`, ...)
//! - its text or `title` reads like a contact call to action
//! - its text or `href` contains a contact keyword

use crate::url::strip_fragment;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

static URL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)/contact", r"(?i)contact-us", r"(?i)contactus", r"(?i)get-in-touch"]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

static TEXT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)contact\s*us",
        r"(?i)get\s*in\s*touch",
        r"(?i)reach\s*out",
        r"(?i)talk\s*to\s*us",
        r"(?i)customer\s*support",
        r"(?i)help\s*center",
        r"(?i)contact",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

const KEYWORDS: &[&str] = &["contact", "reach", "connect", "touch"];

/// Finds probable contact-page links in an HTML document
///
/// # Arguments
///
/// * `html` - The HTML content of the page
/// * `base_url` - The page URL, used to resolve relative links
///
/// # Returns
///
/// Absolute `http(s)` URLs in document order, without duplicates and without
/// the page itself
///
/// # Example
///
/// ```
/// use sitescout::crawler::extract_contact_links;
/// use url::Url;
///
/// let html = r#"<a href="/contact-us">Contact</a><a href="/pricing">Pricing</a>"#;
/// let base = Url::parse("https://acme.io/").unwrap();
/// assert_eq!(extract_contact_links(html, &base), vec!["https://acme.io/contact-us"]);
/// ```
pub fn extract_contact_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let own_url = strip_fragment(base_url.clone());
    let mut links: Vec<String> = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let text = element.text().collect::<String>().trim().to_lowercase();
        let title = element.value().attr("title").unwrap_or_default().to_lowercase();

        if !is_contact_link(href, &text, &title) {
            continue;
        }

        let Some(resolved) = resolve_link(href, base_url) else {
            continue;
        };

        if resolved == own_url {
            continue;
        }

        let resolved = resolved.to_string();
        if !links.contains(&resolved) {
            links.push(resolved);
        }
    }

    links
}

/// Returns true if a link looks like it leads to a contact page
fn is_contact_link(href: &str, text: &str, title: &str) -> bool {
    if URL_PATTERNS.iter().any(|p| p.is_match(href)) {
        return true;
    }

    if TEXT_PATTERNS
        .iter()
        .any(|p| p.is_match(text) || p.is_match(title))
    {
        return true;
    }

    let href = href.to_lowercase();
    KEYWORDS
        .iter()
        .any(|k| text.contains(k) || href.contains(k))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(strip_fragment(absolute)),
        _ => None,
    }
}
