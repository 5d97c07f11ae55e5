use crate::config::validation::{build_header_map, parse_header};
use crate::ConfigResult;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Default request timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 100;

/// Default connection limit passed to the transport
pub const DEFAULT_CONNECTION_LIMIT: usize = 1024;

/// On-disk configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub spider: SpiderSection,

    /// Default request headers sent with every fetch
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Transport behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SpiderSection {
    /// Request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of concurrent connections the transport may open
    #[serde(rename = "connection-limit", default = "default_connection_limit")]
    pub connection_limit: usize,

    /// Skip TLS certificate validation
    #[serde(rename = "accept-invalid-certs", default)]
    pub accept_invalid_certs: bool,
}

impl Default for SpiderSection {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connection_limit: DEFAULT_CONNECTION_LIMIT,
            accept_invalid_certs: false,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_connection_limit() -> usize {
    DEFAULT_CONNECTION_LIMIT
}

/// Runtime configuration applied to the transport before a run starts
///
/// Header names in `default_headers` are case-insensitive.
#[derive(Debug, Clone)]
pub struct SpiderConfig {
    /// Per-request timeout
    pub timeout: Duration,

    /// Connection-limit hint enforced by the transport, not by the engine
    pub connection_limit: usize,

    /// Headers added to every request
    pub default_headers: HeaderMap,

    /// Skip TLS certificate validation
    pub accept_invalid_certs: bool,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connection_limit: DEFAULT_CONNECTION_LIMIT,
            default_headers: HeaderMap::new(),
            accept_invalid_certs: false,
        }
    }
}

impl SpiderConfig {
    /// Sets the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection-limit hint
    pub fn with_connection_limit(mut self, limit: usize) -> Self {
        self.connection_limit = limit;
        self
    }

    /// Adds a default request header, replacing any existing value for the same name
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidHeader` if the name or value is not a valid header token.
    pub fn with_header(mut self, name: &str, value: &str) -> ConfigResult<Self> {
        let (name, value) = parse_header(name, value)?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Builds the runtime configuration from a parsed file
    pub(crate) fn from_file(file: &ConfigFile) -> ConfigResult<Self> {
        Ok(Self {
            timeout: Duration::from_secs(file.spider.timeout_secs),
            connection_limit: file.spider.connection_limit,
            default_headers: build_header_map(&file.headers)?,
            accept_invalid_certs: file.spider.accept_invalid_certs,
        })
    }
}
