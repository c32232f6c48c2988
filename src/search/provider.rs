use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::config::ReverseSearchConfig;
use super::error::SearchError;
use super::types::ImageResult;

/// SerpApi reports "no results" through its `error` field rather than an empty list.
const NO_RESULTS_MARKER: &str = "hasn't returned any results";

/// A reverse-image search provider.
#[async_trait]
pub trait ReverseImageSearch: Send + Sync {
    /// Searches by a publicly reachable image URL. Results keep the provider's ranking.
    async fn search(&self, image_url: &str) -> Result<Vec<ImageResult>, SearchError>;
}

/// Client for SerpApi's Google reverse-image engine.
#[derive(Clone)]
pub struct SerpApiClient {
    http: Client,
    url: String,
    engine: String,
    api_key: String,
}

impl std::fmt::Debug for SerpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerpApiClient")
            .field("url", &self.url)
            .field("engine", &self.engine)
            .finish()
    }
}

impl SerpApiClient {
    pub fn new(config: &ReverseSearchConfig) -> Result<Self, SearchError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SearchError::InvalidConfig {
                reason: "missing search API key".to_string(),
            })?;

        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            url: config.url.clone(),
            engine: config.engine.clone(),
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    image_results: Vec<ImageResult>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl ReverseImageSearch for SerpApiClient {
    async fn search(&self, image_url: &str) -> Result<Vec<ImageResult>, SearchError> {
        let resp = self
            .http
            .get(&self.url)
            .query(&[
                ("engine", self.engine.as_str()),
                ("image_url", image_url),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(SearchError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SerpApiResponse = resp.json().await?;
        if let Some(message) = parsed.error {
            if message.contains(NO_RESULTS_MARKER) {
                return Ok(Vec::new());
            }
            return Err(SearchError::Provider { message });
        }

        debug!(results = parsed.image_results.len(), "Reverse image search returned");
        Ok(parsed.image_results)
    }
}
