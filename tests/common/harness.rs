//! Test server harness.

use badgelife::cache::{CacheConfig, ResultCache};
use badgelife::catalog::{BadgeCatalog, BadgeRecord, CatalogMaintenance, InMemoryCatalog};
use badgelife::embedding::{
    EmbeddingApiConfig, EmbeddingMatcher, EmbeddingProvider, HttpEmbeddingClient, MatcherConfig,
    MockEmbeddingProvider,
};
use badgelife::gateway::{HandlerState, create_router_with_state};
use badgelife::pipeline::{IdentificationPipeline, TextMatchConfig};
use badgelife::search::{
    ImageHost, ImageHostConfig, ImageResult, KeywordFilter, MockImageHost,
    MockReverseImageSearch, ObjectStorageHost, ReverseImageSearch, ReverseSearchConfig,
    SerpApiClient, WebSearchStage,
};
use badgelife::vision::{ChatVisionClient, MockVisionModel, VisionConfig, VisionModel, VisionStage};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;
const TEST_MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// Which mock providers the test server runs with. `None` leaves a stage unconfigured.
pub struct TestServerConfig {
    pub badges: Vec<(BadgeRecord, Vec<f32>)>,
    pub embedder: Option<MockEmbeddingProvider>,
    pub search: Option<MockReverseImageSearch>,
    pub vision: Option<MockVisionModel>,
    pub max_image_bytes: usize,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            badges: Vec::new(),
            embedder: Some(MockEmbeddingProvider::new().with_image_vector(vec![1.0, 0.0])),
            search: Some(MockReverseImageSearch::new(Vec::new())),
            vision: Some(MockVisionModel::identifying("Mystery Badge", 40)),
            max_image_bytes: TEST_MAX_IMAGE_BYTES,
        }
    }
}

impl TestServerConfig {
    pub fn with_badge(mut self, badge: BadgeRecord, embedding: Vec<f32>) -> Self {
        self.badges.push((badge, embedding));
        self
    }

    pub fn with_search_results(mut self, results: Vec<ImageResult>) -> Self {
        self.search = Some(MockReverseImageSearch::new(results));
        self
    }

    pub fn with_embedder(mut self, embedder: Option<MockEmbeddingProvider>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_vision(mut self, vision: Option<MockVisionModel>) -> Self {
        self.vision = vision;
        self
    }
}

/// Handles on the mocks behind a running test server, for call-count assertions.
pub struct TestMocks {
    pub catalog: Arc<InMemoryCatalog>,
    pub embedder: Option<Arc<MockEmbeddingProvider>>,
    pub search: Option<Arc<MockReverseImageSearch>>,
    pub host: Arc<MockImageHost>,
    pub vision: Option<Arc<MockVisionModel>>,
}

impl TestMocks {
    pub fn search_calls(&self) -> usize {
        self.search.as_ref().map_or(0, |s| s.calls())
    }

    pub fn vision_calls(&self) -> usize {
        self.vision.as_ref().map_or(0, |v| v.calls())
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub mocks: Option<TestMocks>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn mocks(&self) -> &TestMocks {
        self.mocks
            .as_ref()
            .expect("server was not spawned with mock providers")
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn wait_for_server_ready(
    addr: SocketAddr,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ServerStartupError> {
    let start = std::time::Instant::now();

    loop {
        if start.elapsed() > timeout {
            return Err(ServerStartupError::Timeout);
        }

        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(_) => {
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("Server failed to start within timeout")]
    Timeout,
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Server startup failed: {0}")]
    StartupFailed(String),
}

/// Spawns a server whose providers are all in-process mocks.
///
/// The catalog is an [`InMemoryCatalog`] seeded with `config.badges`; the image host always
/// succeeds. Nothing leaves the process.
pub async fn spawn_test_server(config: TestServerConfig) -> Result<TestServer, ServerStartupError> {
    let catalog = Arc::new(InMemoryCatalog::new());
    for (badge, embedding) in config.badges {
        catalog.insert_with_embedding(badge, embedding);
    }

    let mocks = TestMocks {
        catalog,
        embedder: config.embedder.map(Arc::new),
        search: config.search.map(Arc::new),
        host: Arc::new(MockImageHost::new()),
        vision: config.vision.map(Arc::new),
    };

    let providers = Providers {
        catalog: mocks.catalog.clone(),
        embedder: mocks
            .embedder
            .clone()
            .map(|e| e as Arc<dyn EmbeddingProvider>),
        search: mocks
            .search
            .clone()
            .map(|s| s as Arc<dyn ReverseImageSearch>),
        host: Some(mocks.host.clone() as Arc<dyn ImageHost>),
        vision: mocks.vision.clone().map(|v| v as Arc<dyn VisionModel>),
        max_image_bytes: config.max_image_bytes,
    };

    let mut server = serve(providers).await?;
    server.mocks = Some(mocks);
    Ok(server)
}

/// Spawns a server with the real HTTP clients, all pointed at `upstream` (an httpmock base URL).
///
/// Exercises request shapes and response decoding of every provider end to end.
pub async fn spawn_wired_server(
    upstream: &str,
    catalog: Arc<InMemoryCatalog>,
) -> Result<TestServer, ServerStartupError> {
    let startup = |e: &dyn std::fmt::Display| ServerStartupError::StartupFailed(e.to_string());

    let embedder = HttpEmbeddingClient::new(&EmbeddingApiConfig {
        api_key: Some("embed-key".to_string()),
        base_url: format!("{upstream}/v1"),
        ..Default::default()
    })
    .map_err(|e| startup(&e))?;

    let search = SerpApiClient::new(&ReverseSearchConfig {
        api_key: Some("serp-key".to_string()),
        url: format!("{upstream}/search.json"),
        ..Default::default()
    })
    .map_err(|e| startup(&e))?;

    let host = ObjectStorageHost::new(&ImageHostConfig {
        url: Some(upstream.to_string()),
        api_key: Some("storage-key".to_string()),
        ..Default::default()
    })
    .map_err(|e| startup(&e))?;

    let vision = ChatVisionClient::new(&VisionConfig {
        api_key: Some("vision-key".to_string()),
        base_url: format!("{upstream}/v1"),
        ..Default::default()
    })
    .map_err(|e| startup(&e))?;

    serve(Providers {
        catalog,
        embedder: Some(Arc::new(embedder)),
        search: Some(Arc::new(search)),
        host: Some(Arc::new(host)),
        vision: Some(Arc::new(vision)),
        max_image_bytes: TEST_MAX_IMAGE_BYTES,
    })
    .await
}

struct Providers {
    catalog: Arc<InMemoryCatalog>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    search: Option<Arc<dyn ReverseImageSearch>>,
    host: Option<Arc<dyn ImageHost>>,
    vision: Option<Arc<dyn VisionModel>>,
    max_image_bytes: usize,
}

async fn serve(providers: Providers) -> Result<TestServer, ServerStartupError> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let local_addr = listener.local_addr()?;

    let catalog: Arc<dyn BadgeCatalog> = providers.catalog;
    let matcher = EmbeddingMatcher::new(
        providers.embedder.clone(),
        catalog.clone(),
        MatcherConfig::default(),
    );
    let web = WebSearchStage::new(providers.search, providers.host, KeywordFilter::default());
    let vision = VisionStage::new(providers.vision);
    let pipeline = IdentificationPipeline::new(
        matcher,
        web,
        vision,
        catalog.clone(),
        TextMatchConfig::default(),
    );

    let cache = Arc::new(ResultCache::new(&CacheConfig::default()));
    let maintenance = CatalogMaintenance::new(catalog, providers.embedder).with_cache(cache.clone());

    let state = HandlerState::new(
        Arc::new(pipeline),
        Arc::new(maintenance),
        cache,
        providers.max_image_bytes,
    );
    let app = create_router_with_state(state);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    wait_for_server_ready(
        local_addr,
        Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS),
        Duration::from_millis(STARTUP_POLL_INTERVAL_MS),
    )
    .await?;

    Ok(TestServer {
        addr: local_addr,
        mocks: None,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
    })
}
