//! MyBadgeLife identification server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use badgelife::cache::ResultCache;
use badgelife::catalog::{BadgeCatalog, CatalogMaintenance, InMemoryCatalog, RestCatalog};
use badgelife::config::Config;
use badgelife::embedding::{EmbeddingMatcher, EmbeddingProvider, HttpEmbeddingClient};
use badgelife::gateway::{HandlerState, create_router_with_state};
use badgelife::pipeline::{IdentificationPipeline, TextMatchConfig};
use badgelife::search::{
    ImageHost, KeywordFilter, ObjectStorageHost, ReverseImageSearch, SerpApiClient,
    WebSearchStage,
};
use badgelife::vision::{ChatVisionClient, VisionModel, VisionStage};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        "MyBadgeLife identification service starting"
    );

    let catalog = build_catalog(&config)?;
    let embedder = build_embedder(&config);

    let filter = match &config.keyword_filter_path {
        Some(path) => KeywordFilter::from_file(path)?,
        None => KeywordFilter::default(),
    };

    let matcher = EmbeddingMatcher::new(embedder.clone(), catalog.clone(), config.matcher.clone());
    let web = WebSearchStage::new(build_search(&config), build_image_host(&config), filter);
    let vision = VisionStage::new(build_vision(&config));

    let text = TextMatchConfig {
        floor: config.text_match_floor,
        top_k: config.matcher.top_k,
    };
    let pipeline = IdentificationPipeline::new(matcher, web, vision, catalog.clone(), text);

    let stages = pipeline.readiness();
    if !stages.any() {
        tracing::warn!("No identification stage is configured; /v1/identify will fail");
    }
    tracing::info!(
        embedding = stages.embedding,
        web_search = stages.web_search,
        vision = stages.vision,
        "Identification stages"
    );

    let cache = Arc::new(ResultCache::new(&config.cache));
    let maintenance = CatalogMaintenance::new(catalog, embedder).with_cache(cache.clone());

    let state = HandlerState::new(
        Arc::new(pipeline),
        Arc::new(maintenance),
        cache,
        config.max_image_bytes,
    );

    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("MyBadgeLife shutdown complete");
    Ok(())
}

fn build_catalog(config: &Config) -> anyhow::Result<Arc<dyn BadgeCatalog>> {
    if let Some(url) = &config.catalog.url {
        tracing::info!(url = %url, "Using REST catalog");
        let catalog = RestCatalog::new(url, config.catalog.api_key.as_deref())?;
        return Ok(Arc::new(catalog));
    }

    match &config.catalog.seed_path {
        Some(path) => {
            let catalog = InMemoryCatalog::from_seed_file(path)?;
            tracing::info!(
                path = %path.display(),
                badges = catalog.badge_count(),
                embeddings = catalog.embedding_count(),
                "Loaded in-memory catalog seed"
            );
            Ok(Arc::new(catalog))
        }
        None => {
            tracing::warn!("No BADGELIFE_CATALOG_URL or seed configured, starting with an empty catalog");
            Ok(Arc::new(InMemoryCatalog::new()))
        }
    }
}

// Providers that fail to build leave their stage unconfigured instead of aborting startup.

fn build_embedder(config: &Config) -> Option<Arc<dyn EmbeddingProvider>> {
    if !config.embedding.is_configured() {
        return None;
    }
    match HttpEmbeddingClient::new(&config.embedding) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "Embedding client unavailable");
            None
        }
    }
}

fn build_search(config: &Config) -> Option<Arc<dyn ReverseImageSearch>> {
    if !config.search.is_configured() {
        return None;
    }
    match SerpApiClient::new(&config.search) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "Reverse image search client unavailable");
            None
        }
    }
}

fn build_image_host(config: &Config) -> Option<Arc<dyn ImageHost>> {
    if !config.storage.is_configured() {
        return None;
    }
    match ObjectStorageHost::new(&config.storage) {
        Ok(host) => Some(Arc::new(host)),
        Err(e) => {
            tracing::warn!(error = %e, "Image host unavailable");
            None
        }
    }
}

fn build_vision(config: &Config) -> Option<Arc<dyn VisionModel>> {
    if !config.vision.is_configured() {
        return None;
    }
    match ChatVisionClient::new(&config.vision) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "Vision client unavailable");
            None
        }
    }
}

fn run_health_check() -> i32 {
    let port = std::env::var("BADGELIFE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
