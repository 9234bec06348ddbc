//! HTTP fetch capability
//!
//! The orchestrator only needs "GET this URL and hand me status, headers and
//! body". [`ReqwestFetcher`] is the production transport; tests inject their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::types::FetchedResponse;

/// HTTP client timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of redirects followed before giving up
const MAX_REDIRECTS: usize = 10;

/// Transport-level failure reported by a [`Fetcher`]
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Performs a single live GET
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, following redirects, and return the full response.
    ///
    /// Non-2xx responses are not errors at this layer.
    async fn fetch(&self, url: &Url) -> Result<FetchedResponse, TransportError>;
}

/// Fetcher backed by a shared reqwest client
#[derive(Clone)]
pub struct ReqwestFetcher {
    http_client: Client,
}

impl ReqwestFetcher {
    /// Build a fetcher with the default timeout and redirect policy
    pub fn new() -> reqwest::Result<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { http_client })
    }

    /// Wrap an already-configured client
    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResponse, TransportError> {
        debug!(url = %url, "Fetching live");

        let response = self.http_client.get(url.as_str()).send().await?;

        let status_code = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        debug!(url = %url, status = status_code, size = bytes.len(), "Fetched");
        Ok(FetchedResponse {
            status_code,
            headers,
            body: bytes.to_vec(),
        })
    }
}
