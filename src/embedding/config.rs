use std::time::Duration;

use crate::config::env;

pub const DEFAULT_EMBEDDING_URL: &str = "https://api.jina.ai/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "jina-clip-v2";
pub const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`HttpEmbeddingClient`](super::HttpEmbeddingClient).
///
/// The model must embed text and images into one space, since catalog entries are embedded from
/// text and queries from photos.
#[derive(Debug, Clone)]
pub struct EmbeddingApiConfig {
    /// API key. `None` leaves the embedding stage unconfigured.
    pub api_key: Option<String>,
    /// Base URL; `/embeddings` is appended.
    pub base_url: String,
    pub model: String,
    /// Requested output dimension, if the API supports truncation.
    pub dimensions: Option<usize>,
    pub timeout: Duration,
}

impl Default for EmbeddingApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_EMBEDDING_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: None,
            timeout: DEFAULT_EMBEDDING_TIMEOUT,
        }
    }
}

impl EmbeddingApiConfig {
    pub const ENV_API_KEY: &'static str = "BADGELIFE_EMBEDDING_API_KEY";
    pub const ENV_URL: &'static str = "BADGELIFE_EMBEDDING_URL";
    pub const ENV_MODEL: &'static str = "BADGELIFE_EMBEDDING_MODEL";
    pub const ENV_DIMENSIONS: &'static str = "BADGELIFE_EMBEDDING_DIMENSIONS";

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::optional_string(Self::ENV_API_KEY),
            base_url: env::string_or(Self::ENV_URL, defaults.base_url),
            model: env::string_or(Self::ENV_MODEL, defaults.model),
            dimensions: env::optional_parse(Self::ENV_DIMENSIONS),
            timeout: defaults.timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
