//! HTTP gateway (Axum) in front of the identification pipeline and catalog maintenance.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{
    badge_search_handler, identify_handler, prune_embeddings_handler,
    regenerate_embedding_handler,
};
pub use state::HandlerState;

use crate::cache::{
    BADGELIFE_STATUS_ERROR, BADGELIFE_STATUS_HEADER, BADGELIFE_STATUS_HEALTHY,
    BADGELIFE_STATUS_NOT_READY, BADGELIFE_STATUS_READY,
};

const CONFIGURED: &str = "configured";
const UNCONFIGURED: &str = "unconfigured";

pub fn create_router_with_state(state: HandlerState) -> Router {
    let body_limit = state.body_limit();

    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/v1/identify", post(identify_handler))
        .route("/v1/badges/search", post(badge_search_handler))
        .route(
            "/v1/badges/{id}/embedding",
            post(regenerate_embedding_handler),
        )
        .route("/v1/embeddings/prune", post(prune_embeddings_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub catalog: &'static str,
    pub embedding: &'static str,
    pub web_search: &'static str,
    pub vision: &'static str,
}

fn configured(flag: bool) -> &'static str {
    if flag { CONFIGURED } else { UNCONFIGURED }
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        BADGELIFE_STATUS_HEADER,
        HeaderValue::from_static(BADGELIFE_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

/// Ready when the catalog answers and at least one stage has credentials.
#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let stages = state.pipeline.readiness();

    let catalog_status = if state.pipeline.catalog().is_ready().await {
        BADGELIFE_STATUS_READY
    } else {
        BADGELIFE_STATUS_ERROR
    };

    let components = ComponentStatus {
        http: BADGELIFE_STATUS_READY,
        catalog: catalog_status,
        embedding: configured(stages.embedding),
        web_search: configured(stages.web_search),
        vision: configured(stages.vision),
    };

    let is_ready = components.catalog == BADGELIFE_STATUS_READY && stages.any();

    let (status_code, status_msg) = if is_ready {
        (StatusCode::OK, BADGELIFE_STATUS_READY)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, BADGELIFE_STATUS_NOT_READY)
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        BADGELIFE_STATUS_HEADER,
        HeaderValue::from_static(status_msg),
    );

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status_msg,
            components,
        }),
    )
        .into_response()
}
