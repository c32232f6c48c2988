//! HTTP client helpers for tests.

use badgelife::analysis::{DatabaseMatch, Identification};
use badgelife::cache::BADGELIFE_STATUS_HEADER;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    /// Posts an identification request; returns the result and the status header.
    pub async fn identify(
        &self,
        image_base64: &str,
        force_web_search: bool,
    ) -> Result<(Identification, String), TestClientError> {
        let resp = self
            .client
            .post(self.url("/v1/identify"))
            .json(&serde_json::json!({
                "imageBase64": image_base64,
                "forceWebSearch": force_web_search,
            }))
            .send()
            .await?;

        let status_header = resp
            .headers()
            .get(BADGELIFE_STATUS_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        match resp.status().as_u16() {
            200 => Ok((resp.json().await?, status_header)),
            400 | 413 => Err(TestClientError::BadRequest(resp.text().await?)),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(TestClientError::UnexpectedStatus(status, body))
            }
        }
    }

    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<DatabaseMatch>, TestClientError> {
        let resp = self
            .client
            .post(self.url("/v1/badges/search"))
            .json(&serde_json::json!({ "query": query, "limit": limit }))
            .send()
            .await?;
        Self::json_or_error(resp).await
    }

    pub async fn regenerate_embedding(
        &self,
        id: &str,
    ) -> Result<serde_json::Value, TestClientError> {
        let resp = self
            .client
            .post(self.url(&format!("/v1/badges/{id}/embedding")))
            .send()
            .await?;
        Self::json_or_error(resp).await
    }

    pub async fn prune(&self) -> Result<serde_json::Value, TestClientError> {
        let resp = self
            .client
            .post(self.url("/v1/embeddings/prune"))
            .send()
            .await?;
        Self::json_or_error(resp).await
    }

    pub async fn health(&self) -> Result<HealthResponse, TestClientError> {
        let resp = self.client.get(self.url("/healthz")).send().await?;
        Self::json_or_error(resp).await
    }

    /// Returns the ready body whatever the status (503 carries the same shape).
    pub async fn ready(&self) -> Result<(u16, ReadyResponse), TestClientError> {
        let resp = self.client.get(self.url("/ready")).send().await?;
        let status = resp.status().as_u16();
        Ok((status, resp.json().await?))
    }

    async fn json_or_error<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, TestClientError> {
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(TestClientError::UnexpectedStatus(status, body))
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComponentStatus {
    pub http: String,
    pub catalog: String,
    pub embedding: String,
    pub web_search: String,
    pub vision: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub components: ComponentStatus,
}

impl ReadyResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ready"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0} - Body: {1}")]
    UnexpectedStatus(u16, String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}
