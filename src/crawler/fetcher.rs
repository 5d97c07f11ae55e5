//! HTTP transport for the crawler
//!
//! This module handles all HTTP requests issued by the engine, including:
//! - Building HTTP clients from the run configuration
//! - Enforcing the transport-level connection limit
//! - Racing every request against the run's cancellation signal
//! - Error classification

use crate::config::SpiderConfig;
use crate::SpiderError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Raw result of a successful round trip
///
/// A response is returned whatever its status code; the engine decides which
/// statuses count as failures.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status code
    pub status: u16,

    /// Response headers
    pub headers: HeaderMap,

    /// Undecoded response body
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Returns the last `Content-Type` header value, if any
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get_all(CONTENT_TYPE)
            .iter()
            .last()
            .and_then(|value| value.to_str().ok())
    }

    /// Returns true for 2xx status codes
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport collaborator used by the engine to issue GET requests
///
/// Implementations must return promptly with `SpiderError::Cancelled` once `cancel`
/// fires.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url`, returning its status, headers and raw body
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<FetchResponse, SpiderError>;
}

/// Builds an HTTP client with the configured timeout and default headers
///
/// # Arguments
///
/// * `config` - The spider configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &SpiderConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout)
        .default_headers(config.default_headers.clone())
        .pool_max_idle_per_host(config.connection_limit)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// `reqwest`-backed transport
///
/// At most `connection_limit` requests are in flight at once; additional fetches wait
/// for a permit.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    connections: Arc<Semaphore>,
}

impl ReqwestTransport {
    /// Creates a transport configured from `config`
    pub fn new(config: &SpiderConfig) -> Result<Self, SpiderError> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config.connection_limit))
    }

    /// Wraps an existing client
    pub fn with_client(client: Client, connection_limit: usize) -> Self {
        Self {
            client,
            connections: Arc::new(Semaphore::new(
                connection_limit.clamp(1, Semaphore::MAX_PERMITS),
            )),
        }
    }

    async fn send(&self, url: &Url) -> Result<FetchResponse, SpiderError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SpiderError::Transport {
                url: url.to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let _permit = self
            .connections
            .acquire()
            .await
            .map_err(|e| SpiderError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let final_url = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?
            .to_vec();

        Ok(FetchResponse {
            url: final_url,
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<FetchResponse, SpiderError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SpiderError::Cancelled { url: url.to_string() }),
            result = self.send(url) => result,
        }
    }
}

/// Maps a reqwest failure onto the crate error type
fn classify_error(url: &Url, error: reqwest::Error) -> SpiderError {
    if error.is_timeout() {
        SpiderError::Timeout {
            url: url.to_string(),
        }
    } else {
        SpiderError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
