//! Router-level tests for the gateway handlers, driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{Router, body::Body, http::Request, http::StatusCode, response::IntoResponse};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use crate::cache::{BADGELIFE_STATUS_HEADER, CacheConfig, ResultCache};
use crate::catalog::{
    BadgeCatalog, BadgeEmbedding, BadgeRecord, CatalogError, CatalogMaintenance, InMemoryCatalog,
};
use crate::embedding::{
    EmbeddingMatcher, EmbeddingProvider, MatcherConfig, MockEmbeddingProvider,
    mock::MOCK_EMBEDDING_DIM,
};
use crate::gateway::create_router_with_state;
use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;
use crate::image::ImageError;
use crate::pipeline::{IdentificationPipeline, PipelineError, TextMatchConfig};
use crate::search::{ImageHost, KeywordFilter, MockImageHost, WebSearchStage};
use crate::vision::{MockVisionModel, VisionModel, VisionStage};

const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

fn jpeg_base64() -> String {
    STANDARD.encode(JPEG_BYTES)
}

struct TestApp {
    router: Router,
    catalog: Arc<InMemoryCatalog>,
    cache: Arc<ResultCache>,
}

struct AppBuilder {
    embedder: Option<Arc<MockEmbeddingProvider>>,
    vision: Option<Arc<MockVisionModel>>,
    max_image_bytes: usize,
}

impl AppBuilder {
    fn new() -> Self {
        Self {
            embedder: Some(Arc::new(
                MockEmbeddingProvider::new().with_image_vector(vec![1.0, 0.0]),
            )),
            vision: Some(Arc::new(MockVisionModel::identifying("Mystery Badge", 40))),
            max_image_bytes: 1024,
        }
    }

    fn without_stages(mut self) -> Self {
        self.embedder = None;
        self.vision = None;
        self
    }

    fn without_embedder(mut self) -> Self {
        self.embedder = None;
        self
    }

    fn with_vision(mut self, vision: Arc<MockVisionModel>) -> Self {
        self.vision = Some(vision);
        self
    }

    fn with_embedder(mut self, embedder: MockEmbeddingProvider) -> Self {
        self.embedder = Some(Arc::new(embedder));
        self
    }

    fn without_vision(mut self) -> Self {
        self.vision = None;
        self
    }

    fn max_image_bytes(mut self, max: usize) -> Self {
        self.max_image_bytes = max;
        self
    }

    fn build(self) -> TestApp {
        let catalog = Arc::new(InMemoryCatalog::new());
        let store: Arc<dyn BadgeCatalog> = catalog.clone();
        let embedder = self.embedder.map(|e| e as Arc<dyn EmbeddingProvider>);

        let matcher = EmbeddingMatcher::new(embedder.clone(), store.clone(), MatcherConfig::default());
        // Search stays unconfigured so the cascade never leaves the process.
        let web = WebSearchStage::new(
            None,
            Some(Arc::new(MockImageHost::new()) as Arc<dyn ImageHost>),
            KeywordFilter::default(),
        );
        let vision = VisionStage::new(self.vision.map(|v| v as Arc<dyn VisionModel>));
        let pipeline = IdentificationPipeline::new(
            matcher,
            web,
            vision,
            store.clone(),
            TextMatchConfig::default(),
        );

        let cache = Arc::new(ResultCache::new(&CacheConfig::default()));
        let maintenance = CatalogMaintenance::new(store, embedder).with_cache(cache.clone());

        let state = HandlerState::new(
            Arc::new(pipeline),
            Arc::new(maintenance),
            cache.clone(),
            self.max_image_bytes,
        );

        TestApp {
            router: create_router_with_state(state),
            catalog,
            cache,
        }
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Option<String>, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let header = response
        .headers()
        .get(BADGELIFE_STATUS_HEADER)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, header, body)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_healthz_reports_healthy() {
        let app = AppBuilder::new().build();
        let (status, header, body) = send(&app.router, get("/healthz")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(header.as_deref(), Some("healthy"));
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_ready_lists_stage_configuration() {
        let app = AppBuilder::new().build();
        let (status, header, body) = send(&app.router, get("/ready")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(header.as_deref(), Some("ready"));
        assert_eq!(body["components"]["catalog"], "ready");
        assert_eq!(body["components"]["embedding"], "configured");
        assert_eq!(body["components"]["web_search"], "unconfigured");
        assert_eq!(body["components"]["vision"], "configured");
    }

    #[tokio::test]
    async fn test_ready_is_unavailable_without_stages() {
        let app = AppBuilder::new().without_stages().build();
        let (status, header, body) = send(&app.router, get("/ready")).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(header.as_deref(), Some("not_ready"));
        assert_eq!(body["status"], "not_ready");
    }
}

mod identify_tests {
    use super::*;

    #[tokio::test]
    async fn test_identify_database_match_then_cache_hit() {
        let app = AppBuilder::new().build();
        app.catalog.insert_with_embedding(
            BadgeRecord::new("DefCon 31 Badge").with_year(2023),
            vec![1.0, 0.0],
        );

        let request = || post_json("/v1/identify", serde_json::json!({ "imageBase64": jpeg_base64() }));

        let (status, header, body) = send(&app.router, request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(header.as_deref(), Some("MISS"));
        assert_eq!(body["analysis"]["name"], "DefCon 31 Badge");
        assert_eq!(body["analysis"]["source"], "database");
        assert_eq!(body["analysis"]["confidence"], 100);
        assert_eq!(body["matches"].as_array().unwrap().len(), 1);
        assert_eq!(
            body["analysis"]["database_matches"][0]["name"],
            "DefCon 31 Badge"
        );

        let (status, header, cached) = send(&app.router, request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(header.as_deref(), Some("HIT"));
        assert_eq!(cached, body);
    }

    #[tokio::test]
    async fn test_identify_accepts_data_url() {
        let app = AppBuilder::new().without_embedder().build();
        let data_url = format!("data:image/jpeg;base64,{}", jpeg_base64());

        let (status, _, body) = send(
            &app.router,
            post_json("/v1/identify", serde_json::json!({ "imageBase64": data_url })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["name"], "Mystery Badge");
        assert_eq!(body["analysis"]["source"], "ai_analysis");
    }

    #[tokio::test]
    async fn test_force_web_search_is_a_separate_cache_entry() {
        let app = AppBuilder::new().build();
        app.catalog
            .insert_with_embedding(BadgeRecord::new("DefCon 31 Badge"), vec![1.0, 0.0]);

        let (_, first, _) = send(
            &app.router,
            post_json("/v1/identify", serde_json::json!({ "imageBase64": jpeg_base64() })),
        )
        .await;
        let (_, forced, body) = send(
            &app.router,
            post_json(
                "/v1/identify",
                serde_json::json!({ "imageBase64": jpeg_base64(), "forceWebSearch": true }),
            ),
        )
        .await;

        assert_eq!(first.as_deref(), Some("MISS"));
        assert_eq!(forced.as_deref(), Some("MISS"));
        // Embedding is skipped, so vision answers.
        assert_eq!(body["analysis"]["source"], "ai_analysis");
    }

    #[tokio::test]
    async fn test_unidentified_badge_is_not_cached() {
        let app = AppBuilder::new().without_vision().build();
        let request = || post_json("/v1/identify", serde_json::json!({ "imageBase64": jpeg_base64() }));

        let (status, first, body) = send(&app.router, request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["source"], "none");
        assert_eq!(body["analysis"]["confidence"], 0);

        let (_, second, _) = send(&app.router, request()).await;
        assert_eq!(first.as_deref(), Some("MISS"));
        assert_eq!(second.as_deref(), Some("MISS"));
    }

    #[tokio::test]
    async fn test_vision_placeholder_is_not_cached() {
        let vision = Arc::new(MockVisionModel::failing());
        let app = AppBuilder::new()
            .without_embedder()
            .with_vision(vision.clone())
            .build();
        let request = || post_json("/v1/identify", serde_json::json!({ "imageBase64": jpeg_base64() }));

        let (status, first, body) = send(&app.router, request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["name"], "Unknown Electronic Badge");
        assert_eq!(body["analysis"]["confidence"], 25);
        assert!(body.get("degraded").is_none());

        let (_, second, _) = send(&app.router, request()).await;
        assert_eq!(first.as_deref(), Some("MISS"));
        assert_eq!(second.as_deref(), Some("MISS"));
        assert_eq!(vision.calls(), 2);
    }

    #[tokio::test]
    async fn test_answer_after_embedding_failure_is_not_cached() {
        let app = AppBuilder::new()
            .with_embedder(MockEmbeddingProvider::failing())
            .build();
        let request = || post_json("/v1/identify", serde_json::json!({ "imageBase64": jpeg_base64() }));

        let (status, first, body) = send(&app.router, request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["name"], "Mystery Badge");

        let (_, second, _) = send(&app.router, request()).await;
        assert_eq!(first.as_deref(), Some("MISS"));
        assert_eq!(second.as_deref(), Some("MISS"));
    }

    #[tokio::test]
    async fn test_identify_rejects_invalid_base64() {
        let app = AppBuilder::new().build();
        let (status, header, body) = send(
            &app.router,
            post_json("/v1/identify", serde_json::json!({ "imageBase64": "@@not base64@@" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(header.as_deref(), Some("invalid_image"));
        assert_eq!(body["code"], 400);
    }

    #[tokio::test]
    async fn test_identify_rejects_empty_image() {
        let app = AppBuilder::new().build();
        let (status, _, _) = send(
            &app.router,
            post_json("/v1/identify", serde_json::json!({ "imageBase64": "" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_identify_rejects_missing_field() {
        let app = AppBuilder::new().build();
        let (status, header, _) = send(
            &app.router,
            post_json("/v1/identify", serde_json::json!({ "image": jpeg_base64() })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(header.as_deref(), Some("invalid_request"));
    }

    #[tokio::test]
    async fn test_identify_rejects_oversized_image() {
        let app = AppBuilder::new().max_image_bytes(4).build();
        let (status, header, _) = send(
            &app.router,
            post_json("/v1/identify", serde_json::json!({ "imageBase64": jpeg_base64() })),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(header.as_deref(), Some("payload_too_large"));
    }

    #[tokio::test]
    async fn test_identify_without_stages_is_configuration_error() {
        let app = AppBuilder::new().without_stages().build();
        let (status, header, _) = send(
            &app.router,
            post_json("/v1/identify", serde_json::json!({ "imageBase64": jpeg_base64() })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(header.as_deref(), Some("configuration_error"));
    }
}

mod search_tests {
    use super::*;

    fn seed(app: &TestApp) {
        app.catalog.insert_with_embedding(
            BadgeRecord::new("Hackaday Supercon Badge").with_year(2023),
            vec![0.0, 1.0],
        );
        app.catalog
            .insert_with_embedding(BadgeRecord::new("DefCon 31 Badge"), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_search_ranks_by_text_similarity() {
        let app = AppBuilder::new().build();
        seed(&app);

        let (status, _, body) = send(
            &app.router,
            post_json(
                "/v1/badges/search",
                serde_json::json!({ "query": "hackaday supercon badge" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let matches = body.as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["badge"]["name"], "Hackaday Supercon Badge");
        assert_eq!(matches[0]["confidence"], 75);
    }

    #[tokio::test]
    async fn test_search_rejects_blank_query() {
        let app = AppBuilder::new().build();
        let (status, _, _) = send(
            &app.router,
            post_json("/v1/badges/search", serde_json::json!({ "query": "   " })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_rejects_zero_limit() {
        let app = AppBuilder::new().build();
        let (status, _, _) = send(
            &app.router,
            post_json(
                "/v1/badges/search",
                serde_json::json!({ "query": "badge", "limit": 0 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod maintenance_tests {
    use super::*;

    #[tokio::test]
    async fn test_regenerate_embedding_stores_vector() {
        let app = AppBuilder::new().build();
        let badge = BadgeRecord::new("Tidal Badge");
        let id = badge.id;
        app.catalog.upsert_badge(badge).await.unwrap();

        let (status, _, body) = send(
            &app.router,
            post_json(&format!("/v1/badges/{id}/embedding"), serde_json::json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["badge_id"], id.to_string());
        assert_eq!(body["dimension"], MOCK_EMBEDDING_DIM);
        assert_eq!(body["model"], "mock-embedding");
        assert!(app.catalog.embedding_for(id).is_some());
    }

    #[tokio::test]
    async fn test_regenerate_embedding_unknown_badge_is_404() {
        let app = AppBuilder::new().build();
        let (status, header, _) = send(
            &app.router,
            post_json(
                &format!("/v1/badges/{}/embedding", Uuid::new_v4()),
                serde_json::json!({}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(header.as_deref(), Some("not_found"));
    }

    #[tokio::test]
    async fn test_regenerate_embedding_rejects_bad_id() {
        let app = AppBuilder::new().build();
        let (status, _, _) = send(
            &app.router,
            post_json("/v1/badges/not-a-uuid/embedding", serde_json::json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_regenerate_embedding_without_provider_is_bad_gateway() {
        let app = AppBuilder::new().without_embedder().build();
        let badge = BadgeRecord::new("Tidal Badge");
        let id = badge.id;
        app.catalog.upsert_badge(badge).await.unwrap();

        let (status, header, _) = send(
            &app.router,
            post_json(&format!("/v1/badges/{id}/embedding"), serde_json::json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(header.as_deref(), Some("embedding_error"));
    }

    #[tokio::test]
    async fn test_prune_removes_orphans_and_clears_cache() {
        let app = AppBuilder::new().build();
        app.catalog
            .insert_with_embedding(BadgeRecord::new("DefCon 31 Badge"), vec![1.0, 0.0]);
        app.catalog
            .upsert_embedding(BadgeEmbedding::new(Uuid::new_v4(), vec![0.5, 0.5]))
            .await
            .unwrap();

        let (_, header, _) = send(
            &app.router,
            post_json("/v1/identify", serde_json::json!({ "imageBase64": jpeg_base64() })),
        )
        .await;
        assert_eq!(header.as_deref(), Some("MISS"));
        app.cache.run_pending_tasks();
        assert_eq!(app.cache.len(), 1);

        let (status, _, body) = send(
            &app.router,
            Request::builder()
                .method("POST")
                .uri("/v1/embeddings/prune")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 1);
        assert_eq!(body["scanned"], 2);

        let (_, header, _) = send(
            &app.router,
            post_json("/v1/identify", serde_json::json!({ "imageBase64": jpeg_base64() })),
        )
        .await;
        assert_eq!(header.as_deref(), Some("MISS"));
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_image_errors_map_to_client_statuses() {
        let too_large = GatewayError::from(ImageError::TooLarge { size: 10, max: 4 }).into_response();
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let empty = GatewayError::from(ImageError::Empty).into_response();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_pipeline_errors_map() {
        let none = GatewayError::from(PipelineError::NoStagesConfigured).into_response();
        assert_eq!(none.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let catalog = GatewayError::from(PipelineError::Catalog(CatalogError::RequestFailed {
            reason: "connection refused".to_string(),
        }))
        .into_response();
        assert_eq!(catalog.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_catalog_not_found_maps_to_404() {
        let id = Uuid::new_v4();
        let err = GatewayError::from(CatalogError::BadgeNotFound { id });
        assert!(matches!(err, GatewayError::BadgeNotFound(found) if found == id));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
