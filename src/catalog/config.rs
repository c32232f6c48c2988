use std::path::PathBuf;

use crate::config::env;

/// Where the catalog lives.
///
/// With a URL the REST backend is used; otherwise an in-memory catalog is created, optionally
/// seeded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    /// Base URL of the PostgREST-style API (without `/rest/v1`).
    pub url: Option<String>,
    /// Service key sent as `apikey` and bearer token.
    pub api_key: Option<String>,
    /// JSON seed for the in-memory catalog.
    pub seed_path: Option<PathBuf>,
}

impl CatalogConfig {
    pub const ENV_URL: &'static str = "BADGELIFE_CATALOG_URL";
    pub const ENV_KEY: &'static str = "BADGELIFE_CATALOG_KEY";
    pub const ENV_SEED: &'static str = "BADGELIFE_CATALOG_SEED";

    pub fn from_env() -> Self {
        Self {
            url: env::optional_string(Self::ENV_URL),
            api_key: env::optional_string(Self::ENV_KEY),
            seed_path: env::optional_path(Self::ENV_SEED),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.url.is_some()
    }
}
