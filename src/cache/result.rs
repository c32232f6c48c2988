//! Identification result cache.
//!
//! Keyed by [`hash_identification_key`] of the decoded image bytes and the request flags, so the
//! same photo submitted twice skips every external call while the entry is fresh.

use std::sync::Arc;

use moka::sync::Cache;
use tracing::debug;

use super::config::CacheConfig;
use crate::analysis::Identification;
use crate::hashing::{hash_identification_key, short_fingerprint};
use crate::image::BadgeImage;

pub struct ResultCache {
    entries: Option<Cache<[u8; 32], Arc<Identification>>>,
}

impl ResultCache {
    pub fn new(config: &CacheConfig) -> Self {
        let entries = config.is_enabled().then(|| {
            Cache::builder()
                .max_capacity(config.capacity)
                .time_to_live(config.ttl)
                .build()
        });
        Self { entries }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self { entries: None }
    }

    #[inline]
    pub fn key_for(image: &BadgeImage, force_web_search: bool) -> [u8; 32] {
        hash_identification_key(image.hash(), force_web_search)
    }

    pub fn get(&self, key: &[u8; 32]) -> Option<Arc<Identification>> {
        let hit = self.entries.as_ref()?.get(key);
        if hit.is_some() {
            debug!(key = %short_fingerprint(key), "Result cache hit");
        }
        hit
    }

    pub fn insert(&self, key: [u8; 32], identification: Arc<Identification>) {
        if let Some(entries) = &self.entries {
            entries.insert(key, identification);
        }
    }

    /// Drops every entry. Called whenever the catalog changes.
    pub fn invalidate_all(&self) {
        if let Some(entries) = &self.entries {
            entries.invalidate_all();
            debug!("Result cache invalidated");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.as_ref().map_or(0, Cache::entry_count)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs pending moka housekeeping so counts are exact (tests).
    pub fn run_pending_tasks(&self) {
        if let Some(entries) = &self.entries {
            entries.run_pending_tasks();
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("enabled", &self.is_enabled())
            .field("entries", &self.len())
            .finish()
    }
}
