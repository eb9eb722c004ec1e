//! Contact channel heuristics: addresses, emails, phone numbers, social links

use super::{char_len_between, collapse_whitespace, push_unique, visible_text, PageDocument, SocialLinks};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

const ADDRESS_KEYWORDS: &[&str] = &[
    "tower", "floor", "building", "office", "address", "street", "road", "avenue", "suite",
];

const ADDRESS_SELECTORS: &[&str] = &[
    r#"[class*="address"]"#,
    r#"[class*="office"]"#,
    r#"[class*="location"]"#,
    r#"[class*="contact"]"#,
    r#"[id*="address"]"#,
    r#"[id*="office"]"#,
    r#"[id*="location"]"#,
    "address",
];

const MAX_ADDRESSES: usize = 5;

static LABELLED_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:office|address)\s*:\s*(.+)").expect("valid regex"));

static ADDRESS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b\d{5,6}\b.*\b(?:india|usa|uk|canada|australia)\b",
        r"(?i)\b(?:maharashtra|gujarat|karnataka|delhi|bangalore|mumbai|pune)\b",
        r"(?i)\b\d+(?:st|nd|rd|th)?\s+(?:floor|level)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex")
});

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\+\d{1,3}[-.\s]?\d{1,4}[-.\s]?\d{1,4}[-.\s]?\d{1,4}[-.\s]?\d{1,9}",
        r"\(\d{3}\)\s?\d{3}[-.\s]?\d{4}",
        r"\d{3}[-.\s]?\d{3}[-.\s]?\d{4}",
        r"\+\d{1,3}\s?\d{8,14}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static PHONE_NEAR_ICON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?[\d\s\-()]{10,}").expect("valid regex"));

const PHONE_ICON_SELECTORS: &[&str] = &[
    r#"i[class*="phone"]"#,
    r#"i[class*="tel"]"#,
    r#"svg[class*="phone"]"#,
    r#"[class*="fa-phone"]"#,
];

/// Street addresses found in address-like containers or address-like text
pub(super) fn addresses(doc: &PageDocument) -> Vec<String> {
    let mut found = Vec::new();

    for text in doc.texts(ADDRESS_SELECTORS) {
        if text.chars().count() > 20 && keyword_hits(&text) >= 1 {
            push_unique(&mut found, text);
        }
    }

    for text in doc.text_blocks() {
        if let Some(caps) = LABELLED_ADDRESS.captures(&text) {
            let value = caps[1].trim().to_string();
            if value.chars().count() > 15 {
                push_unique(&mut found, value);
            }
        }

        if keyword_hits(&text) >= 2 && text.chars().count() > 30 {
            push_unique(&mut found, text.clone());
        }

        if ADDRESS_PATTERNS.iter().any(|p| p.is_match(&text)) {
            push_unique(&mut found, text);
        }
    }

    found
        .into_iter()
        .map(|a| collapse_whitespace(&a))
        .filter(|a| char_len_between(a, 21, 499))
        .take(MAX_ADDRESSES)
        .collect()
}

fn keyword_hits(text: &str) -> usize {
    let lower = text.to_lowercase();
    ADDRESS_KEYWORDS.iter().filter(|k| lower.contains(*k)).count()
}

/// First profile link per social network
pub(super) fn social_links(doc: &PageDocument) -> SocialLinks {
    let mut links = SocialLinks::default();

    for anchor in doc.select_all(&["a[href]"]) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let candidate = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("https://{}", href)
        };

        // A bare domain link is a share button, not a profile
        let has_path = Url::parse(&candidate).is_ok_and(|u| u.path().len() > 1);
        if !has_path {
            continue;
        }

        let slot = if candidate.contains("linkedin.com") || candidate.contains("linkedin.in") {
            &mut links.linkedin
        } else if candidate.contains("instagram.com") || candidate.contains("instagr.am") {
            &mut links.instagram
        } else if candidate.contains("reddit.com") {
            &mut links.reddit
        } else if candidate.contains("facebook.com") || candidate.contains("fb.com") {
            &mut links.facebook
        } else if candidate.contains("twitter.com") || candidate.contains("x.com") {
            &mut links.twitter
        } else {
            continue;
        };

        if slot.is_none() {
            *slot = Some(candidate);
        }
    }

    links
}

/// Email addresses from mailto links and body text, lowercased
pub(super) fn emails(doc: &PageDocument) -> Vec<String> {
    let mut found = Vec::new();

    for anchor in doc.select_all(&[r#"a[href^="mailto:"]"#]) {
        if let Some(href) = anchor.value().attr("href") {
            let address = href
                .trim_start_matches("mailto:")
                .split('?')
                .next()
                .unwrap_or_default()
                .trim();
            if is_valid_email(address) {
                push_unique(&mut found, address.to_lowercase());
            }
        }
    }

    for m in EMAIL.find_iter(doc.body_text()) {
        if is_valid_email(m.as_str()) {
            push_unique(&mut found, m.as_str().to_lowercase());
        }
    }

    found
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
        && !email.contains("example.com")
        && !email.contains("test.com")
        && !email.contains("placeholder")
}

/// Phone numbers from tel links, phone icons and body text, digits only
pub(super) fn phone_numbers(doc: &PageDocument) -> Vec<String> {
    let mut found = Vec::new();

    for anchor in doc.select_all(&[r#"a[href^="tel:"]"#]) {
        if let Some(href) = anchor.value().attr("href") {
            let cleaned = clean_phone(href.trim_start_matches("tel:"));
            if is_valid_phone(&cleaned) {
                push_unique(&mut found, cleaned);
            }
        }
    }

    for icon in doc.select_all(PHONE_ICON_SELECTORS) {
        let container = icon.ancestors().filter_map(scraper::ElementRef::wrap).find(|el| {
            matches!(el.value().name(), "li" | "div" | "span" | "p")
        });
        if let Some(container) = container {
            let text = visible_text(container);
            for m in PHONE_NEAR_ICON.find_iter(&text) {
                let cleaned = clean_phone(m.as_str());
                if is_valid_phone(&cleaned) {
                    push_unique(&mut found, cleaned);
                }
            }
        }
    }

    for pattern in PHONE_PATTERNS.iter() {
        for m in pattern.find_iter(doc.body_text()) {
            let cleaned = clean_phone(m.as_str());
            if is_valid_phone(&cleaned) {
                push_unique(&mut found, cleaned);
            }
        }
    }

    found
}

fn clean_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect()
}

fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (10..=15).contains(&digits)
}
