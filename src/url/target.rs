use crate::UrlError;
use url::Url;

/// Longest free-text scan accepted as a search query
pub const MAX_QUERY_LEN: usize = 100;

/// What a scan request asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanInput {
    /// Crawl these URLs directly
    Targets(Vec<String>),
    /// Look the text up with the search fallback first
    Query(String),
}

/// Parses a scan entry as a crawl target
///
/// # Rules
///
/// - Must parse as an absolute URL
/// - Scheme must be `http` or `https`
/// - Host must contain a dot (`localhost`-style hosts are rejected)
///
/// # Examples
///
/// ```
/// use sitescout::url::parse_target;
///
/// assert!(parse_target("https://acme.io/about").is_ok());
/// assert!(parse_target("acme").is_err());
/// ```
pub fn parse_target(input: &str) -> Result<Url, UrlError> {
    let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if host.contains('.') => Ok(url),
        _ => Err(UrlError::MissingDomain),
    }
}

/// Returns true if `input` is a crawlable target
pub fn is_crawlable_url(input: &str) -> bool {
    parse_target(input).is_ok()
}

/// Keeps the crawlable entries, dropping the rest with a warning
///
/// Targets keep their original spelling so results are keyed by what the
/// caller asked for. Duplicates are removed.
pub fn parse_targets<S: AsRef<str>>(inputs: &[S]) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for input in inputs {
        let input = input.as_ref().trim();
        match parse_target(input) {
            Ok(_) => {
                if !targets.iter().any(|t| t == input) {
                    targets.push(input.to_string());
                }
            }
            Err(e) => tracing::warn!("Skipping scan entry '{}': {}", input, e),
        }
    }
    targets
}

/// Decides whether a scan is a list of targets or a search query
///
/// A scan made of a single entry that is not a URL is treated as a query,
/// provided it is between 1 and [`MAX_QUERY_LEN`] characters long.
///
/// # Returns
///
/// * `Ok(ScanInput)` - Targets to crawl or a query to search
/// * `Err(UrlError)` - A single entry that is neither a URL nor a usable query
pub fn classify_scan<S: AsRef<str>>(inputs: &[S]) -> Result<ScanInput, UrlError> {
    if let [single] = inputs {
        let single = single.as_ref().trim();
        if let Err(e) = parse_target(single) {
            let len = single.chars().count();
            if len == 0 || len > MAX_QUERY_LEN {
                return Err(e);
            }
            return Ok(ScanInput::Query(single.to_string()));
        }
    }

    Ok(ScanInput::Targets(parse_targets(inputs)))
}

/// Returns `url` without its fragment, for deduplication
pub fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
