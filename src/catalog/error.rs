use std::path::PathBuf;
use thiserror::Error;

use super::model::BadgeId;

/// Errors returned by catalog stores.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("catalog returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("failed to decode catalog response: {reason}")]
    DecodeFailed { reason: String },

    #[error("failed to load catalog seed from {path}: {reason}")]
    SeedLoadFailed { path: PathBuf, reason: String },

    #[error("badge not found: {id}")]
    BadgeNotFound { id: BadgeId },

    #[error("embedding unavailable for badge {id}: {reason}")]
    EmbeddingUnavailable { id: BadgeId, reason: String },
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CatalogError::DecodeFailed {
                reason: err.to_string(),
            }
        } else {
            CatalogError::RequestFailed {
                reason: err.to_string(),
            }
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
