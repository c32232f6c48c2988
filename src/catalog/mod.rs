//! Badge catalog: records, their embeddings, and the stores that hold them.
//!
//! The catalog is an opaque store reached through simple CRUD calls. Two backends exist:
//! [`RestCatalog`] talks to a PostgREST-style HTTP API, [`InMemoryCatalog`] keeps everything in
//! process (local runs and tests).
//!
//! Embeddings are derived data. [`CatalogMaintenance`] regenerates them when a badge's
//! descriptive text changes and prunes the ones left behind by deleted badges.

pub mod config;
pub mod error;
pub mod maintenance;
pub mod memory;
pub mod model;
pub mod rest;
pub mod store;


pub use config::CatalogConfig;
pub use error::{CatalogError, CatalogResult};
pub use maintenance::{BadgeUpdate, CatalogMaintenance, PruneReport};
pub use memory::{CatalogSeed, InMemoryCatalog};
pub use model::{BadgeEmbedding, BadgeId, BadgeRecord, descriptor_text};
pub use rest::RestCatalog;
pub use store::BadgeCatalog;

pub const BADGES_TABLE: &str = "badges";
pub const EMBEDDINGS_TABLE: &str = "badge_embeddings";
