use std::path::PathBuf;
use thiserror::Error;

/// Errors from the reverse-image search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("search provider returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("search provider error: {message}")]
    Provider { message: String },

    #[error("failed to decode search response: {reason}")]
    DecodeFailed { reason: String },

    #[error("invalid search configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("failed to load keyword filter from {path}: {reason}")]
    FilterLoadFailed { path: PathBuf, reason: String },
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::DecodeFailed {
                reason: err.to_string(),
            }
        } else {
            SearchError::RequestFailed {
                reason: err.to_string(),
            }
        }
    }
}

/// Errors from the temporary image store.
#[derive(Debug, Error)]
pub enum HostingError {
    #[error("image upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("image delete failed: {reason}")]
    DeleteFailed { reason: String },

    #[error("storage returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("invalid storage configuration: {reason}")]
    InvalidConfig { reason: String },
}
