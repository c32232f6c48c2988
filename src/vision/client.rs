use async_openai::types::chat::{CreateChatCompletionRequest, CreateChatCompletionResponse};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use super::config::VisionConfig;
use super::error::VisionError;
use super::{SYSTEM_PROMPT, USER_PROMPT};
use crate::image::BadgeImage;

#[async_trait]
/// A generative model that can look at a badge photo.
pub trait VisionModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Returns the model's raw text answer for `image`.
    async fn describe(&self, image: &BadgeImage) -> Result<String, VisionError>;
}

/// Vision client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// The image is sent inline as a `data:` URL.
#[derive(Clone)]
pub struct ChatVisionClient {
    http: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl std::fmt::Debug for ChatVisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatVisionClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl ChatVisionClient {
    pub fn new(config: &VisionConfig) -> Result<Self, VisionError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| VisionError::InvalidConfig {
                reason: "missing vision API key".to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                VisionError::InvalidConfig {
                    reason: format!("invalid vision API key: {e}"),
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
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Builds the typed chat request for `image`.
    pub fn build_request(
        &self,
        image: &BadgeImage,
    ) -> Result<CreateChatCompletionRequest, VisionError> {
        serde_json::from_value(serde_json::json!({
            "model": self.model,
            "max_completion_tokens": self.max_tokens,
            "temperature": 0.2,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": USER_PROMPT },
                        { "type": "image_url", "image_url": { "url": image.data_url() } }
                    ]
                }
            ]
        }))
        .map_err(|e| VisionError::InvalidRequest {
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl VisionModel for ChatVisionClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn describe(&self, image: &BadgeImage) -> Result<String, VisionError> {
        let request = self.build_request(image)?;

        let resp = self.http.post(&self.endpoint).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(VisionError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let response: CreateChatCompletionResponse =
            resp.json().await.map_err(|e| VisionError::InvalidJson {
                reason: e.to_string(),
            })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(VisionError::EmptyResponse)?;

        debug!(model = %self.model, chars = content.len(), "Received vision answer");
        Ok(content)
    }
}
