use crate::config::types::{ConfigFile, SpiderSection};
use crate::ConfigError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;

/// Validates the entire configuration
pub fn validate(config: &ConfigFile) -> Result<(), ConfigError> {
    validate_spider_section(&config.spider)?;
    build_header_map(&config.headers)?;
    Ok(())
}

/// Validates transport settings
fn validate_spider_section(config: &SpiderSection) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be greater than 0".to_string(),
        ));
    }

    if config.connection_limit == 0 {
        return Err(ConfigError::Validation(
            "connection-limit must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Converts configured headers into a case-insensitive header map
pub fn build_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ConfigError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let (name, value) = parse_header(name, value)?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Parses a single header name/value pair
pub fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ConfigError::InvalidHeader(format!("'{}': {}", name, e)))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| ConfigError::InvalidHeader(format!("value for '{}': {}", name, e)))?;
    Ok((header_name, header_value))
}
