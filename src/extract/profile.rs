//! Company profile heuristics
//!
//! Names, taglines, descriptions, offerings, industries, founding year and
//! operational status.

use super::{char_len_between, collapse_whitespace, push_unique, OperationalStatus, PageDocument, StatusLabel};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

// ===== Company names =====

static TITLE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[-|]\s*(?:Home|About|Contact|Welcome).*$").expect("valid regex")
});

static COPYRIGHT_HOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)©\s*(?:\d{4}(?:\s*[-–]\s*\d{4})?\s*)?([^.©]+?)(?:\s*\d{4})?\.?\s*(?:all rights reserved|$)")
        .expect("valid regex")
});

static COPYRIGHT_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"©.*?\d{4}").expect("valid regex"));

static ABOUT_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\babout\s+([^-|.]+?)(?:\s*[-|.]|\s*$)",
        r"(?i)\bwelcome\s+to\s+([^-|.]+?)(?:\s*[-|.]|\s*$)",
    ])
});

const NAME_META: &[&str] = &[
    r#"meta[property="og:site_name"]"#,
    r#"meta[name="application-name"]"#,
    r#"meta[name="apple-mobile-web-app-title"]"#,
];

const NAME_SELECTORS: &[&str] = &[
    "header h1",
    "header .logo",
    r#"header [class*="brand"]"#,
    r#"header [class*="company"]"#,
    ".navbar-brand",
    ".logo",
    r#"[class*="company-name"]"#,
];

/// Candidate company names from title, metadata, branding and copyright lines
pub(super) fn company_names(doc: &PageDocument) -> Vec<String> {
    let mut found = Vec::new();

    if let Some(title) = doc.title() {
        let cleaned = TITLE_SUFFIX.replace(&title, "").trim().to_string();
        if char_len_between(&cleaned, 3, 99) {
            push_unique(&mut found, cleaned);
        }
    }

    for css in NAME_META {
        if let Some(content) = doc.attr(css, "content") {
            if char_len_between(&content, 3, 99) {
                push_unique(&mut found, content);
            }
        }
    }

    for text in doc.texts(NAME_SELECTORS) {
        if char_len_between(&text, 3, 99) {
            push_unique(&mut found, text);
        }
    }

    for block in doc.text_blocks() {
        if !COPYRIGHT_YEAR.is_match(&block) {
            continue;
        }
        if let Some(caps) = COPYRIGHT_HOLDER.captures(&block) {
            let holder = caps[1].trim().to_string();
            if char_len_between(&holder, 3, 99) {
                push_unique(&mut found, holder);
            }
        }
    }

    for pattern in ABOUT_NAME.iter() {
        if let Some(caps) = pattern.captures(doc.body_text()) {
            let name = caps[1].trim().to_string();
            if char_len_between(&name, 3, 49) {
                push_unique(&mut found, name);
            }
        }
    }

    found
        .into_iter()
        .map(|n| collapse_whitespace(&n))
        .filter(|n| char_len_between(n, 3, 99))
        .take(5)
        .collect()
}

// ===== Taglines =====

const TAGLINE_META: &[&str] = &[
    r#"meta[name="description"]"#,
    r#"meta[property="og:description"]"#,
    r#"meta[name="twitter:description"]"#,
];

const TAGLINE_SELECTORS: &[&str] = &[
    "header h2",
    "header h3",
    "header p",
    "header .tagline",
    "header .slogan",
    "header .subtitle",
    ".navbar .tagline",
    ".navbar .slogan",
    ".logo + *",
    ".brand + *",
    ".hero h2",
    ".hero h3",
    ".hero p",
    ".banner h2",
    ".banner h3",
    ".banner p",
    ".jumbotron h2",
    ".jumbotron h3",
    ".jumbotron p",
    r#"[class*="hero"] h2"#,
    r#"[class*="hero"] h3"#,
    r#"[class*="hero"] p"#,
    ".tagline",
    ".slogan",
    ".subtitle",
    ".motto",
    r#"[class*="tagline"]"#,
    r#"[class*="slogan"]"#,
    r#"[class*="subtitle"]"#,
];

static TAGLINE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:your trusted|leading provider|we are|committed to|dedicated to|specializing in|experts in)\b.{10,70}",
        r"(?i)\b(?:innovative|professional|reliable|quality|excellence|solution)\b.{10,70}",
    ])
});

const GENERIC_PHRASES: &[&str] = &["welcome to our website", "home page", "contact us", "about us"];

/// Short slogans from metadata, headers, hero banners and marketing phrases
pub(super) fn taglines(doc: &PageDocument) -> Vec<String> {
    let mut found = Vec::new();

    for css in TAGLINE_META {
        if let Some(content) = doc.attr(css, "content") {
            if char_len_between(&content, 10, 80) {
                push_unique(&mut found, content);
            }
        }
    }

    for text in doc.texts(TAGLINE_SELECTORS) {
        if char_len_between(&text, 10, 80) {
            push_unique(&mut found, text);
        }
    }

    for pattern in TAGLINE_PATTERNS.iter() {
        for m in pattern.find_iter(doc.body_text()) {
            let phrase = m.as_str().trim().to_string();
            if char_len_between(&phrase, 10, 80) {
                push_unique(&mut found, phrase);
            }
        }
    }

    found
        .into_iter()
        .filter(|t| {
            let lower = t.to_lowercase();
            !GENERIC_PHRASES.iter().any(|g| lower.contains(g))
        })
        .take(3)
        .collect()
}

// ===== Descriptions =====

const ABOUT_PARAGRAPHS: &[&str] = &[
    r#"[class*="about"] p"#,
    r#"[id*="about"] p"#,
];

const MAIN_PARAGRAPHS: &[&str] = &["main p", ".content p", ".main-content p"];

static DESCRIPTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:we are|founded in|established in|our company|our mission)\b.{50,400}",
        r"(?i)\b(?:since \d{4}|for over \d+ years|leading provider|specializing in)\b.{50,400}",
    ])
});

/// Paragraph-length descriptions of the business
pub(super) fn descriptions(doc: &PageDocument) -> Vec<String> {
    let mut found = Vec::new();

    for text in doc.texts(ABOUT_PARAGRAPHS) {
        if char_len_between(&text, 50, 500) {
            push_unique(&mut found, text);
        }
    }

    if let Some(content) = doc.attr(r#"meta[name="description"]"#, "content") {
        if content.chars().count() >= 50 {
            push_unique(&mut found, content);
        }
    }

    for data in doc.json_ld() {
        if let Some(description) = data.get("description").and_then(|d| d.as_str()) {
            let is_org = data.get("@type").and_then(|t| t.as_str()) == Some("Organization");
            if is_org || description.chars().count() >= 50 {
                push_unique(&mut found, description.trim().to_string());
            }
        }
    }

    for pattern in DESCRIPTION_PATTERNS.iter() {
        for m in pattern.find_iter(doc.body_text()) {
            let text = m.as_str().trim().to_string();
            if char_len_between(&text, 50, 500) {
                push_unique(&mut found, text);
            }
        }
    }

    for text in doc.texts(MAIN_PARAGRAPHS) {
        if char_len_between(&text, 50, 500) {
            push_unique(&mut found, text);
        }
    }

    found
        .into_iter()
        .filter(|d| char_len_between(d, 50, 500))
        .take(3)
        .collect()
}

// ===== Products and services =====

const NAV_SELECTORS: &[&str] = &[
    "nav ul li a",
    "nav ol li a",
    ".navbar ul li a",
    ".navbar ol li a",
    ".menu ul li a",
    ".menu ol li a",
    "header nav a",
    "header ul li a",
];

const OFFERING_SELECTORS: &[&str] = &[
    r#"[class*="service"] h2"#,
    r#"[class*="service"] h3"#,
    r#"[class*="product"] h2"#,
    r#"[class*="product"] h3"#,
    r#"[class*="solution"] h2"#,
    r#"[class*="solution"] h3"#,
    r#"[class*="offering"] h2"#,
    r#"[class*="offering"] h3"#,
    r#"section[class*="services"] ul li"#,
    r#"section[class*="products"] ul li"#,
    ".services-list li",
    ".products-list li",
    ".card h2",
    ".card h3",
    ".card-title",
    ".tile h2",
    ".tile h3",
    ".tile-title",
    r#"[class*="card"] h2"#,
    r#"[class*="card"] h3"#,
    r#"[class*="tile"] h2"#,
    r#"[class*="tile"] h3"#,
];

const GENERIC_NAV_ITEMS: &[&str] = &[
    "home", "about", "about us", "contact", "contact us", "blog", "news", "careers", "login",
    "register", "privacy", "terms", "support", "help", "faq",
];

/// Products and services named in navigation, service sections and cards
pub(super) fn products_services(doc: &PageDocument) -> Vec<String> {
    let mut found = Vec::new();

    for text in doc.texts(NAV_SELECTORS) {
        if !GENERIC_NAV_ITEMS.contains(&text.to_lowercase().as_str()) {
            push_unique(&mut found, text);
        }
    }

    for text in doc.texts(OFFERING_SELECTORS) {
        if char_len_between(&text, 3, 50) {
            push_unique(&mut found, text);
        }
    }

    found
        .into_iter()
        .filter(|s| char_len_between(s, 3, 50))
        .take(10)
        .collect()
}

// ===== Industries =====

const INDUSTRY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Technology", &["software", "development", "tech", "digital", "it", "programming", "coding"]),
    ("Healthcare", &["medical", "healthcare", "hospital", "clinical", "pharmaceutical", "health"]),
    ("Finance", &["financial", "banking", "investment", "fintech", "insurance", "accounting"]),
    ("Manufacturing", &["manufacturing", "industrial", "production", "factory", "automotive"]),
    ("Education", &["education", "learning", "training", "academic", "school", "university"]),
    ("Retail", &["retail", "ecommerce", "shopping", "store", "merchandise", "commerce"]),
    ("Real Estate", &["real estate", "property", "construction", "architecture", "building"]),
    ("Marketing", &["marketing", "advertising", "branding", "promotion", "digital marketing"]),
    ("Consulting", &["consulting", "advisory", "strategy", "business consulting", "management"]),
    ("Legal", &["legal", "law", "attorney", "lawyer", "litigation", "compliance"]),
];

static INDUSTRY_MENTIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:industry|sector|market|field|domain)\b.{0,50}\b(?:technology|healthcare|finance|manufacturing|education|retail|legal|consulting|marketing|construction)\b",
        r"(?i)\b(?:we serve|our clients|working with|specializing in|experts in)\b.{0,50}\b(?:technology|healthcare|finance|manufacturing|education|retail|legal|consulting|marketing|construction)\b",
    ])
});

static KEYWORD_PATTERNS: Lazy<Vec<(&'static str, Vec<Regex>)>> = Lazy::new(|| {
    INDUSTRY_KEYWORDS
        .iter()
        .map(|(industry, keywords)| {
            let patterns = keywords
                .iter()
                .map(|k| Regex::new(&format!(r"\b{}\b", regex::escape(k))).expect("valid regex"))
                .collect();
            (*industry, patterns)
        })
        .collect()
});

/// Up to three industries, ranked by keyword frequency and direct mentions
pub(super) fn industries(doc: &PageDocument) -> Vec<String> {
    let text = doc.body_text().to_lowercase();
    let mut scores: HashMap<&str, usize> = HashMap::new();

    for (industry, patterns) in KEYWORD_PATTERNS.iter() {
        let score: usize = patterns.iter().map(|p| p.find_iter(&text).count()).sum();
        if score > 0 {
            scores.insert(industry, score);
        }
    }

    for pattern in INDUSTRY_MENTIONS.iter() {
        for m in pattern.find_iter(&text) {
            for (industry, _) in INDUSTRY_KEYWORDS {
                if m.as_str().contains(&industry.to_lowercase()) {
                    *scores.entry(industry).or_default() += 5;
                }
            }
        }
    }

    let mut ranked: Vec<(&str, usize)> = scores.into_iter().collect();
    // Ties keep declaration order so results are stable
    ranked.sort_by(|(a_name, a), (b_name, b)| {
        b.cmp(a).then_with(|| industry_rank(a_name).cmp(&industry_rank(b_name)))
    });

    ranked
        .into_iter()
        .take(3)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn industry_rank(name: &str) -> usize {
    INDUSTRY_KEYWORDS
        .iter()
        .position(|(n, _)| *n == name)
        .unwrap_or(usize::MAX)
}

// ===== Founding year =====

static FOUNDED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:founded|established|since|est\.?)\s+(?:in\s+)?(\d{4})\b",
        r"(?i)\b(\d{4})\s*-\s*present\b",
    ])
});

static COPYRIGHT_YEARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"©\s*(\d{4})").expect("valid regex"));

static ANNIVERSARY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(\d+)\s+years?\s+(?:of\s+)?(?:experience|service|excellence|operation)\b",
        r"(?i)\bcelebrating\s+(\d+)\s+years?\b",
    ])
});

/// Most frequently supported founding year, if any
pub(super) fn year_founded(doc: &PageDocument, current_year: i32) -> Option<i32> {
    let text = doc.body_text();
    let mut candidates: Vec<i32> = Vec::new();

    for pattern in FOUNDED_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let Ok(year) = caps[1].parse::<i32>() {
                if (1800..=current_year).contains(&year) {
                    candidates.push(year);
                }
            }
        }
    }

    for caps in COPYRIGHT_YEARS.captures_iter(text) {
        if let Ok(year) = caps[1].parse::<i32>() {
            if (1900..=current_year - 2).contains(&year) {
                candidates.push(year);
            }
        }
    }

    for pattern in ANNIVERSARY_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let Ok(years) = caps[1].parse::<i32>() {
                let founded = current_year - years;
                if (1..=100).contains(&years) && founded >= 1800 {
                    candidates.push(founded);
                }
            }
        }
    }

    for data in doc.json_ld() {
        let year = data
            .get("foundingDate")
            .and_then(|d| d.as_str())
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse::<i32>().ok());
        if let Some(year) = year {
            if (1800..=current_year).contains(&year) {
                candidates.push(year);
            }
        }
    }

    // Most frequent wins; ties go to the earliest candidate seen
    let mut counts: Vec<(i32, usize)> = Vec::new();
    for year in candidates {
        match counts.iter_mut().find(|(y, _)| *y == year) {
            Some((_, n)) => *n += 1,
            None => counts.push((year, 1)),
        }
    }
    counts
        .iter()
        .fold(None, |best: Option<(i32, usize)>, &(year, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((year, n)),
        })
        .map(|(year, _)| year)
}

// ===== Operational status =====

static ACTIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:currently|now|today|this year)\b",
        r"(?i)\b(?:hiring|careers|job openings|apply now)\b",
        r"(?i)\b(?:contact us|get in touch|reach out)\b",
        r"(?i)\b(?:latest news|recent|upcoming|new)\b",
    ])
});

static INACTIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:was|were|used to|formerly|previously)\b",
        r"(?i)\b(?:under construction|coming soon|temporarily closed)\b",
        r"(?i)\b(?:out of business|closed|discontinued)\b",
    ])
});

static MAINTENANCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:under maintenance|temporarily unavailable|site update)\b",
        r"(?i)\b(?:404|page not found|broken link)\b",
    ])
});

/// Scores active, inactive and maintenance signals into a status label
pub(super) fn operational_status(doc: &PageDocument, current_year: i32) -> OperationalStatus {
    let text = doc.body_text();
    let mut indicators = Vec::new();

    let mut active = 0usize;
    for pattern in ACTIVE_PATTERNS.iter() {
        let hits = pattern.find_iter(text).count();
        if hits > 0 {
            active += hits;
            indicators.push(format!("Active language patterns found ({})", hits));
        }
    }

    let mut inactive = 0usize;
    for pattern in INACTIVE_PATTERNS.iter() {
        let hits = pattern.find_iter(text).count();
        if hits > 0 {
            inactive += hits;
            indicators.push(format!("Inactive language patterns found ({})", hits));
        }
    }

    let year_pattern = format!(r"\b{}\b", current_year);
    if let Ok(year_re) = Regex::new(&year_pattern) {
        let hits = year_re.find_iter(text).count();
        if hits > 0 {
            active += hits * 2;
            indicators.push(format!("Current year mentioned {} times", hits));
        }
    }

    if !doc
        .select_all(&[r#"form[action*="contact"]"#, r#"form[class*="contact"]"#])
        .is_empty()
    {
        active += 5;
        indicators.push("Contact forms present".to_string());
    }

    if !doc
        .select_all(&[
            r#"a[href*="facebook"]"#,
            r#"a[href*="twitter"]"#,
            r#"a[href*="linkedin"]"#,
            r#"a[href*="instagram"]"#,
        ])
        .is_empty()
    {
        active += 3;
        indicators.push("Social media links present".to_string());
    }

    let mut maintenance = 0usize;
    for pattern in MAINTENANCE_PATTERNS.iter() {
        let hits = pattern.find_iter(text).count();
        if hits > 0 {
            maintenance += hits;
            indicators.push(format!("Maintenance indicators found ({})", hits));
        }
    }

    let (status, confidence) = if maintenance > 0 {
        (StatusLabel::Maintenance, (maintenance as f64 * 20.0).min(100.0))
    } else if active > inactive * 2 {
        let share = active as f64 / (active + inactive) as f64;
        (StatusLabel::Active, (share * 100.0).min(100.0))
    } else if inactive > active * 2 {
        let share = inactive as f64 / (active + inactive) as f64;
        (StatusLabel::Inactive, (share * 100.0).min(100.0))
    } else {
        (StatusLabel::Uncertain, 50.0)
    };

    OperationalStatus {
        status,
        confidence,
        indicators,
    }
}
