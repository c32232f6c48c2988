use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cache::BADGELIFE_STATUS_HEADER;
use crate::catalog::{BadgeId, CatalogError};
use crate::image::ImageError;
use crate::pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid image: {0}")]
    InvalidImage(#[from] ImageError),

    #[error("badge not found: {0}")]
    BadgeNotFound(BadgeId),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("catalog error: {0}")]
    CatalogFailed(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<CatalogError> for GatewayError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::BadgeNotFound { id } => GatewayError::BadgeNotFound(id),
            CatalogError::EmbeddingUnavailable { .. } => {
                GatewayError::EmbeddingFailed(err.to_string())
            }
            other => GatewayError::CatalogFailed(other.to_string()),
        }
    }
}

impl From<PipelineError> for GatewayError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NoStagesConfigured => GatewayError::Configuration(err.to_string()),
            PipelineError::Catalog(inner) => inner.into(),
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, badgelife_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::InvalidImage(ImageError::TooLarge { .. }) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
            }
            GatewayError::InvalidImage(_) => (StatusCode::BAD_REQUEST, "invalid_image"),
            GatewayError::BadgeNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
            GatewayError::CatalogFailed(_) => (StatusCode::BAD_GATEWAY, "catalog_error"),
            GatewayError::EmbeddingFailed(_) => (StatusCode::BAD_GATEWAY, "embedding_error"),
            GatewayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            BADGELIFE_STATUS_HEADER,
            HeaderValue::from_static(badgelife_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
