//! HTTP fetcher backed by reqwest.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use super::{FetchError, Fetcher, DEFAULT_TIMEOUT};

/// Fetches images over HTTP(S) with a fixed timeout
pub struct HttpFetcher {
    /// HTTP client (timeout and user agent baked in)
    client: reqwest::Client,

    /// Timeout applied to every request
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout and user agent
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT, default_user_agent())
    }

    /// Create a fetcher with a custom timeout and user agent
    pub fn with_timeout(timeout: Duration, user_agent: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.into())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, timeout })
    }

    /// Timeout applied to each request
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// `localimg/<version>`
pub fn default_user_agent() -> String {
    format!("localimg/{}", env!("CARGO_PKG_VERSION"))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(url, e))?;
        debug!(url, bytes = body.len(), "Fetched");

        Ok(body.to_vec())
    }
}
