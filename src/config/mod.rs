//! Configuration module for Spider-Engine
//!
//! This module handles loading, parsing, and validating TOML configuration files and
//! exposes the runtime [`SpiderConfig`] handed to the transport.
//!
//! # Example
//!
//! ```no_run
//! use spider_engine::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spider.toml")).unwrap();
//! println!("Request timeout: {:?}", config.timeout);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ConfigFile, SpiderConfig, SpiderSection};

// Re-export parser functions
pub use parser::{load_config, parse_config};
