use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads, overrides and validates a configuration file
///
/// Environment overrides (see [`apply_env_overrides`]) are applied after the
/// TOML is parsed and before validation, so a proxy list supplied through the
/// environment is held to the same credential rules as one in the file.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sitescout::config::load_config;
///
/// let config = load_config(Path::new("sitescout.toml")).unwrap();
/// println!("Proxies: {}", config.proxy.servers.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate(&config)?;

    Ok(config)
}

/// Parses TOML content into a configuration without validating it
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Applies environment overrides using the given variable lookup
///
/// | Variable | Overrides |
/// |----------|-----------|
/// | `SITESCOUT_PROXIES` | `proxy.servers` (comma separated) |
/// | `SITESCOUT_PROXY_USERNAME` | `proxy.username` |
/// | `SITESCOUT_PROXY_PASSWORD` | `proxy.password` |
/// | `SITESCOUT_SEARCH_API_KEY` | `search.api-key` |
/// | `SITESCOUT_SEARCH_ENGINE_ID` | `search.engine-id` |
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(list) = lookup("SITESCOUT_PROXIES") {
        config.proxy.servers = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        tracing::debug!(
            "Proxy list taken from environment ({} entries)",
            config.proxy.servers.len()
        );
    }

    if let Some(username) = lookup("SITESCOUT_PROXY_USERNAME") {
        config.proxy.username = Some(username);
    }

    if let Some(password) = lookup("SITESCOUT_PROXY_PASSWORD") {
        config.proxy.password = Some(password);
    }

    if let Some(key) = lookup("SITESCOUT_SEARCH_API_KEY") {
        config.search.api_key = Some(key);
    }

    if let Some(engine) = lookup("SITESCOUT_SEARCH_ENGINE_ID") {
        config.search.engine_id = Some(engine);
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the configuration they used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
