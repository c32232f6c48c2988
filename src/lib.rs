//! MyBadgeLife badge identification library (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! ## Cascade
//! - [`IdentificationPipeline`] - embedding match, reverse-image search, vision fallback
//! - [`EmbeddingMatcher`], [`WebSearchStage`], [`VisionStage`] - the individual stages
//! - [`combine`] - merges stage outputs into one [`Identification`]
//!
//! ## Catalog
//! - [`BadgeCatalog`] - storage seam, with [`RestCatalog`] and [`InMemoryCatalog`]
//! - [`CatalogMaintenance`] - embedding regeneration and orphan pruning
//!
//! ## Utilities
//! - [`cosine_similarity`], [`text_similarity`] - scoring primitives
//! - [`BadgeImage`] - request image decoding
//! - Hashing functions for image fingerprints and cache keys
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod analysis;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod gateway;
pub mod hashing;
pub mod image;
pub mod pipeline;
pub mod search;
pub mod similarity;
pub mod vision;

pub use analysis::{
    AnalysisResult, AnalysisSource, DatabaseMatch, Identification, StageResults, combine,
};
pub use cache::{
    BADGELIFE_STATUS_ERROR, BADGELIFE_STATUS_HEADER, BADGELIFE_STATUS_HEALTHY,
    BADGELIFE_STATUS_NOT_READY, BADGELIFE_STATUS_READY, CacheConfig, CacheStatus, ResultCache,
};
pub use catalog::{
    BadgeCatalog, BadgeEmbedding, BadgeId, BadgeRecord, CatalogError, CatalogMaintenance,
    InMemoryCatalog, PruneReport, RestCatalog, descriptor_text,
};
pub use config::{Config, ConfigError};
pub use embedding::{
    EmbeddingError, EmbeddingInput, EmbeddingMatcher, EmbeddingProvider, HttpEmbeddingClient,
    MatcherConfig,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbeddingProvider;
pub use hashing::{hash_bytes, hash_identification_key};
pub use image::{BadgeImage, ImageError};
pub use pipeline::{IdentificationPipeline, IdentifyOptions, PipelineError, StageReadiness};
pub use search::{
    ImageHost, ImageResult, KeywordFilter, ObjectStorageHost, ReverseImageSearch, SerpApiClient,
    WebSearchHit, WebSearchStage,
};
#[cfg(any(test, feature = "mock"))]
pub use search::{MockImageHost, MockReverseImageSearch};
pub use similarity::{cosine_similarity, text_similarity};
pub use vision::{ChatVisionClient, VisionAnalysis, VisionModel, VisionStage};
#[cfg(any(test, feature = "mock"))]
pub use vision::MockVisionModel;
