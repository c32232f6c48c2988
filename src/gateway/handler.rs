use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::error::GatewayError;
use super::payload::{BadgeSearchRequest, EmbeddingSummary, IdentifyRequest};
use super::state::HandlerState;
use crate::analysis::Identification;
use crate::cache::{BADGELIFE_STATUS_HEADER, CacheStatus, ResultCache};
use crate::hashing::short_fingerprint;
use crate::image::BadgeImage;
use crate::pipeline::IdentifyOptions;

#[instrument(skip(state, request), fields(force_web_search = tracing::field::Empty, image = tracing::field::Empty))]
pub async fn identify_handler(
    State(state): State<HandlerState>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: IdentifyRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;

    let image = BadgeImage::decode(&request.image_base64, state.max_image_bytes)?;

    let span = tracing::Span::current();
    span.record("force_web_search", request.force_web_search);
    span.record(
        "image",
        tracing::field::display(short_fingerprint(image.hash())),
    );

    let key = ResultCache::key_for(&image, request.force_web_search);
    if let Some(cached) = state.cache.get(&key) {
        debug!("Result cache hit");
        return Ok(make_response(&cached, CacheStatus::Hit));
    }

    let identification = state
        .pipeline
        .identify(
            &image,
            IdentifyOptions {
                force_web_search: request.force_web_search,
            },
        )
        .await?;

    info!(
        name = %identification.analysis.name,
        source = %identification.analysis.source,
        confidence = identification.analysis.confidence,
        matches = identification.matches.len(),
        "Badge identified"
    );

    let identification = Arc::new(identification);
    if identification.is_cacheable() {
        state.cache.insert(key, Arc::clone(&identification));
    } else {
        debug!(degraded = identification.degraded, "Result not cached");
    }

    Ok(make_response(&identification, CacheStatus::Miss))
}

pub(crate) fn make_response(identification: &Identification, status: CacheStatus) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        BADGELIFE_STATUS_HEADER,
        HeaderValue::from_static(status.as_header_value()),
    );
    (StatusCode::OK, headers, Json(identification)).into_response()
}

#[instrument(skip(state, request))]
pub async fn badge_search_handler(
    State(state): State<HandlerState>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: BadgeSearchRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;

    if request.query.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "query must not be empty".to_string(),
        ));
    }
    if request.limit == Some(0) {
        return Err(GatewayError::InvalidRequest(
            "limit must be at least 1".to_string(),
        ));
    }

    let matches = state
        .pipeline
        .search_catalog(&request.query, request.limit)
        .await?;

    Ok(Json(matches).into_response())
}

#[instrument(skip(state))]
pub async fn regenerate_embedding_handler(
    State(state): State<HandlerState>,
    Path(id): Path<String>,
) -> Result<Response, GatewayError> {
    let id = Uuid::parse_str(&id)
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid badge id '{}': {}", id, e)))?;

    let embedding = state.maintenance.regenerate_embedding(id).await?;

    Ok(Json(EmbeddingSummary::from(&embedding)).into_response())
}

#[instrument(skip(state))]
pub async fn prune_embeddings_handler(
    State(state): State<HandlerState>,
) -> Result<Response, GatewayError> {
    let report = state.maintenance.prune_orphans().await?;
    Ok(Json(report).into_response())
}
