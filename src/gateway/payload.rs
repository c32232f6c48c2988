use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{BadgeEmbedding, BadgeId};

/// Body of `POST /v1/identify`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    /// Raw base64 or a `data:` URL.
    pub image_base64: String,
    #[serde(default)]
    pub force_web_search: bool,
}

/// Body of `POST /v1/badges/search`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BadgeSearchRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Summary of a regenerated embedding (the vector itself is not echoed).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingSummary {
    pub badge_id: BadgeId,
    pub model: Option<String>,
    pub dimension: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&BadgeEmbedding> for EmbeddingSummary {
    fn from(embedding: &BadgeEmbedding) -> Self {
        Self {
            badge_id: embedding.badge_id,
            model: embedding.model.clone(),
            dimension: embedding.dimension(),
            updated_at: embedding.updated_at,
        }
    }
}
