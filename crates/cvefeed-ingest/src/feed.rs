//! Upstream vulnerability feed client (NVD API 2.0)

use async_trait::async_trait;
use cvefeed_core::{Error, RawVulnerability, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One page of the upstream feed
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub results_per_page: u32,
    pub start_index: u32,
    pub total_results: u32,
    #[serde(default)]
    pub vulnerabilities: Vec<RawVulnerability>,
}

/// Capability the ingestion pipeline needs from the upstream feed.
///
/// Best-effort and non-transactional; pages may overlap or shift between
/// calls while the upstream dataset changes.
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch_page(&self, start_index: u32, results_per_page: u32) -> Result<FeedPage>;
}

/// NVD API 2.0 feed client
pub struct NvdFeed {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    request_delay: Duration,
}

impl NvdFeed {
    /// Create a feed client.
    ///
    /// The inter-page delay follows NVD rate limits: 50 requests/30s with an
    /// API key, 5 requests/30s without.
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let request_delay = if api_key.is_some() {
            Duration::from_millis(600)
        } else {
            Duration::from_secs(6)
        };

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?,
            api_url: api_url.into(),
            api_key,
            request_delay,
        })
    }

    /// Override the inter-page delay
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Delay the full-sync loop should sleep between pages
    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }
}

#[async_trait]
impl FeedClient for NvdFeed {
    async fn fetch_page(&self, start_index: u32, results_per_page: u32) -> Result<FeedPage> {
        let url = format!(
            "{}?startIndex={}&resultsPerPage={}",
            self.api_url, start_index, results_per_page
        );
        debug!("Fetching feed page: {}", url);

        let mut request = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            request = request.header("apiKey", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::FeedFailed(format!("Failed to fetch feed page: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::FeedFailed(format!(
                "Feed returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse feed response: {}", e)))
    }
}
