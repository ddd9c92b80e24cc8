//! HTTP client for fetching JSON documents
//!
//! Downloads a JSON response body so it can be stored in the file cache.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default timeout for a single request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when fetching a JSON document
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Client for fetching JSON over HTTP
#[derive(Debug, Clone)]
pub struct JsonFetcher {
    client: Client,
}

impl JsonFetcher {
    /// Creates a fetcher with the default timeout
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a fetcher whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches `url` and decodes the body as JSON
    ///
    /// # Returns
    /// * `Ok(Value)` with the decoded body
    /// * `Err(FetchError::Status)` for non-2xx responses
    /// * `Err(FetchError)` for transport or decoding failures
    pub async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        debug!(url, "fetching");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        debug!(url, bytes = body.len(), "fetched");
        parse_body(&body)
    }
}

/// Decodes a response body as JSON
fn parse_body(body: &[u8]) -> Result<Value, FetchError> {
    Ok(serde_json::from_slice(body)?)
}
