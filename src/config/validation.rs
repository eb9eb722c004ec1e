use crate::config::types::{
    BrowserConfig, Config, ContactConfig, ProxyConfig, RetryConfig, SearchConfig,
};
use crate::ConfigError;
use url::Url;

/// Resource types the browser can be told to abort
pub const RESOURCE_TYPES: &[&str] = &[
    "document",
    "stylesheet",
    "image",
    "media",
    "font",
    "script",
    "texttrack",
    "xhr",
    "fetch",
    "prefetch",
    "eventsource",
    "websocket",
    "manifest",
    "signedexchange",
    "ping",
    "cspviolationreport",
    "preflight",
    "other",
];

const PROXY_SCHEMES: &[&str] = &["http", "https", "socks4", "socks5"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_browser_config(&config.browser)?;
    validate_retry_config(&config.retry)?;
    validate_contact_config(&config.contact)?;
    validate_proxy_config(&config.proxy)?;
    validate_search_config(&config.search)?;
    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "navigation-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.default_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "default-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.network_idle_ms == 0 || config.network_idle_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "network idle settings must be non-zero".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for resource in &config.blocked_resources {
        if !RESOURCE_TYPES.contains(&resource.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unknown resource type in blocked-resources: '{}'",
                resource
            )));
        }
    }

    Ok(())
}

/// Validates retry ceilings
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_url_attempts == 0 {
        return Err(ConfigError::Validation(
            "max-url-attempts must be >= 1".to_string(),
        ));
    }

    if config.max_batch_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-batch-retries must be <= 10, got {}",
            config.max_batch_retries
        )));
    }

    Ok(())
}

/// Validates contact crawl settings
fn validate_contact_config(config: &ContactConfig) -> Result<(), ConfigError> {
    if config.pool_size < 1 || config.pool_size > 16 {
        return Err(ConfigError::Validation(format!(
            "contact pool-size must be between 1 and 16, got {}",
            config.pool_size
        )));
    }

    Ok(())
}

/// Validates the proxy directory
///
/// A proxy list without both credentials is refused outright: running the
/// proxies unauthenticated would only produce a batch of 407 failures.
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.servers.is_empty() {
        return Ok(());
    }

    let has_username = config.username.as_deref().is_some_and(|u| !u.is_empty());
    let has_password = config.password.as_deref().is_some_and(|p| !p.is_empty());
    if !has_username || !has_password {
        return Err(ConfigError::Validation(
            "proxy servers are configured but proxy username and password are missing"
                .to_string(),
        ));
    }

    for endpoint in &config.servers {
        validate_proxy_endpoint(endpoint)?;
    }

    Ok(())
}

/// Validates a proxy endpoint (`scheme://host:port` or `host:port`)
fn validate_proxy_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    if endpoint.contains("://") {
        let url = Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidProxy(format!("'{}': {}", endpoint, e)))?;

        if !PROXY_SCHEMES.contains(&url.scheme()) {
            return Err(ConfigError::InvalidProxy(format!(
                "'{}': unsupported scheme '{}'",
                endpoint,
                url.scheme()
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidProxy(format!(
                "'{}': missing host",
                endpoint
            )));
        }

        return Ok(());
    }

    match endpoint.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
        _ => Err(ConfigError::InvalidProxy(format!(
            "'{}': expected host:port",
            endpoint
        ))),
    }
}

/// Validates web-search settings
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::Validation(format!("Invalid search endpoint: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "Search endpoint must be HTTP(S), got '{}'",
            config.endpoint
        )));
    }

    if config.max_results == 0 || config.max_results > 10 {
        return Err(ConfigError::Validation(format!(
            "search max-results must be between 1 and 10, got {}",
            config.max_results
        )));
    }

    Ok(())
}
