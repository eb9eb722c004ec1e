//! Configuration module for Sitescout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; an empty file yields the default settings.
//!
//! # Example
//!
//! ```no_run
//! use sitescout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitescout.toml")).unwrap();
//! println!("Navigation timeout: {}s", config.browser.navigation_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, ContactConfig, ProxyConfig, ProxyCredentials, RetryConfig,
    SearchConfig, DEFAULT_SEARCH_ENDPOINT, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate;
