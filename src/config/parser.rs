use crate::config::types::{ConfigFile, SpiderConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(SpiderConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<SpiderConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
///
/// # Example
///
/// ```
/// use spider_engine::config::parse_config;
///
/// let config = parse_config("[spider]\ntimeout-secs = 5").unwrap();
/// assert_eq!(config.timeout.as_secs(), 5);
/// assert_eq!(config.connection_limit, 1024);
/// ```
pub fn parse_config(content: &str) -> Result<SpiderConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(content)?;

    validate(&file)?;

    SpiderConfig::from_file(&file)
}
