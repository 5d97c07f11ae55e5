//! Spider-Engine: a recursive, concurrent site crawler
//!
//! This crate fetches a seed page, extracts its links and recursively fetches every
//! previously unseen link, fanning out concurrently and joining each subtree before
//! its parent branch is considered finished. Each distinct URL is fetched at most once
//! per run.

pub mod config;
pub mod crawler;
pub mod state;

use thiserror::Error;

/// Main error type for Spider-Engine operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("A crawl run is already in progress on this spider")]
    AlreadyRunning,

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unsuccessful status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request cancelled for {url}")]
    Cancelled { url: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpiderError {
    /// Returns true if this error was caused by the run being cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),
}

/// Result type alias for Spider-Engine operations
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::SpiderConfig;
pub use crawler::{FetchResponse, Page, ReqwestTransport, Spider, Transport, Traversal};
pub use state::{History, Progress};
