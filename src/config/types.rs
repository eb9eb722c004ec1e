use serde::Deserialize;
use std::time::Duration;

/// Desktop user agent presented by every page
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Default custom-search endpoint used by the web-search fallback
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Main configuration structure for Sitescout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Browser launch and page behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BrowserConfig {
    /// Path to a Chrome/Chromium binary; autodetected when absent
    pub executable: Option<String>,

    /// User agent string set on every page
    pub user_agent: String,

    /// Navigation timeout for a single `goto` (seconds)
    pub navigation_timeout_secs: u64,

    /// Default timeout for every other page operation (seconds)
    pub default_timeout_secs: u64,

    /// Quiet period that counts as network idle (milliseconds)
    pub network_idle_ms: u64,

    /// Ceiling for the network idle wait (seconds)
    pub network_idle_timeout_secs: u64,

    /// Ceiling for the root element fallback wait (seconds)
    pub selector_fallback_timeout_secs: u64,

    /// Resource types aborted by request interception
    pub blocked_resources: Vec<String>,

    /// Extra command line switches passed to the browser
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            navigation_timeout_secs: 30,
            default_timeout_secs: 60,
            network_idle_ms: 1000,
            network_idle_timeout_secs: 60,
            selector_fallback_timeout_secs: 10,
            blocked_resources: vec![
                "image".to_string(),
                "stylesheet".to_string(),
                "font".to_string(),
            ],
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }

    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.network_idle_timeout_secs)
    }

    pub fn selector_fallback_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_fallback_timeout_secs)
    }
}

/// Retry ceilings and backoff delays
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryConfig {
    /// Number of escalated passes allowed after the first one
    pub max_batch_retries: u32,

    /// Extraction attempts allowed per URL across all passes
    pub max_url_attempts: u32,

    /// In-place retries for a failed navigation or a 5xx response
    pub max_navigation_retries: u32,

    /// In-place retries for page creation
    pub max_page_create_retries: u32,

    /// Delay between 5xx retries (milliseconds)
    pub server_error_backoff_ms: u64,

    /// Pause before an escalated pass starts (milliseconds)
    pub escalation_pause_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_batch_retries: 2,
            max_url_attempts: 3,
            max_navigation_retries: 2,
            max_page_create_retries: 3,
            server_error_backoff_ms: 1000,
            escalation_pause_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn server_error_backoff(&self) -> Duration {
        Duration::from_millis(self.server_error_backoff_ms)
    }

    pub fn escalation_pause(&self) -> Duration {
        Duration::from_millis(self.escalation_pause_ms)
    }
}

/// Contact page crawl settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ContactConfig {
    /// Whether incomplete pages trigger a contact crawl
    pub enabled: bool,

    /// Number of contact pages crawled concurrently
    pub pool_size: usize,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pool_size: 3,
        }
    }
}

/// Ordered proxy endpoints and their shared credentials
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProxyConfig {
    /// Proxy endpoints, tried in order
    pub servers: Vec<String>,

    pub username: Option<String>,

    pub password: Option<String>,
}

impl ProxyConfig {
    /// Returns the endpoint at `index`, if configured
    pub fn endpoint(&self, index: usize) -> Option<&str> {
        self.servers.get(index).map(String::as_str)
    }

    /// Returns the shared credentials when both halves are present
    pub fn credentials(&self) -> Option<ProxyCredentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(ProxyCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

/// Username/password pair answered to proxy auth challenges
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Web-search fallback settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SearchConfig {
    pub api_key: Option<String>,

    pub engine_id: Option<String>,

    /// Search API endpoint
    pub endpoint: String,

    /// Maximum number of result links used as targets
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            max_results: 10,
        }
    }
}
