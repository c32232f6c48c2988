use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::EmbeddingApiConfig;
use super::error::EmbeddingError;
use crate::image::BadgeImage;
use crate::similarity::normalize_vector;

/// What to embed.
#[derive(Debug, Clone, Copy)]
pub enum EmbeddingInput<'a> {
    Text(&'a str),
    Image(&'a BadgeImage),
}

#[async_trait]
/// External embedding API.
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier stored next to generated embeddings.
    fn model_name(&self) -> &str;

    /// Returns a unit-length embedding for `input`.
    async fn embed(&self, input: EmbeddingInput<'_>) -> Result<Vec<f32>, EmbeddingError>;
}

/// Client for an OpenAI-compatible `/embeddings` endpoint that accepts multimodal input items
/// (`{"text": ...}` / `{"image": <base64>}`).
#[derive(Clone)]
pub struct HttpEmbeddingClient {
    http: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
}

impl std::fmt::Debug for HttpEmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbeddingClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl HttpEmbeddingClient {
    pub fn new(config: &EmbeddingApiConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| EmbeddingError::InvalidConfig {
                reason: "missing embedding API key".to_string(),
            })?;
        if config.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "missing embedding model name".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                EmbeddingError::InvalidConfig {
                    reason: format!("invalid embedding API key: {e}"),
                }
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, input: EmbeddingInput<'_>) -> Result<Vec<f32>, EmbeddingError> {
        let item = match input {
            EmbeddingInput::Text(text) => InputItem::Text { text },
            EmbeddingInput::Image(image) => InputItem::Image {
                image: image.to_base64(),
            },
        };

        let request = EmbeddingRequest {
            model: &self.model,
            input: vec![item],
            dimensions: self.dimensions,
        };

        let resp = self.http.post(&self.endpoint).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let mut parsed: EmbeddingResponse = resp.json().await?;
        parsed.data.sort_by_key(|entry| entry.index);
        let raw = parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| EmbeddingError::MalformedVector {
                reason: "response contained no embeddings".to_string(),
            })?;

        debug!(dim = raw.len(), model = %self.model, "Received embedding");

        normalize_vector(&raw).ok_or_else(|| EmbeddingError::MalformedVector {
            reason: format!("vector of length {} is empty, zero or non-finite", raw.len()),
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<InputItem<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum InputItem<'a> {
    Text { text: &'a str },
    Image { image: String },
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
