//! Adapter interfaces for external systems.
//!
//! The only external system is the remote host an image lives on. The
//! [`Fetcher`] trait hides it so the asset cache can be exercised without
//! a network.

pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

// Re-export the HTTP adapter
pub use http::HttpFetcher;

/// Default bound on a single fetch
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reasons a fetch can fail
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

/// Trait for fetching remote bytes
///
/// Implementations make exactly one attempt per call. Callers do not retry.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Human-readable fetcher name
    fn name(&self) -> &str;

    /// Fetch the body of `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
