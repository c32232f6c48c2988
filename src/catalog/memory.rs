use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::error::{CatalogError, CatalogResult};
use super::model::{BadgeEmbedding, BadgeId, BadgeRecord};
use super::store::BadgeCatalog;

/// JSON shape of a catalog seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub badges: Vec<BadgeRecord>,
    #[serde(default)]
    pub embeddings: Vec<BadgeEmbedding>,
}

/// Process-local catalog.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    badges: RwLock<HashMap<BadgeId, BadgeRecord>>,
    embeddings: RwLock<HashMap<BadgeId, BadgeEmbedding>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> Self {
        let catalog = Self::new();
        {
            let mut badges = catalog.badges.write();
            for badge in seed.badges {
                badges.insert(badge.id, badge);
            }
        }
        {
            let mut embeddings = catalog.embeddings.write();
            for embedding in seed.embeddings {
                embeddings.insert(embedding.badge_id, embedding);
            }
        }
        catalog
    }

    pub fn from_seed_file(path: &Path) -> CatalogResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| CatalogError::SeedLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let seed: CatalogSeed =
            serde_json::from_str(&raw).map_err(|e| CatalogError::SeedLoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_seed(seed))
    }

    /// Inserts a badge together with its embedding.
    pub fn insert_with_embedding(&self, badge: BadgeRecord, embedding: Vec<f32>) {
        let id = badge.id;
        self.badges.write().insert(id, badge);
        self.embeddings
            .write()
            .insert(id, BadgeEmbedding::new(id, embedding));
    }

    pub fn badge_count(&self) -> usize {
        self.badges.read().len()
    }

    pub fn embedding_count(&self) -> usize {
        self.embeddings.read().len()
    }

    pub fn embedding_for(&self, id: BadgeId) -> Option<BadgeEmbedding> {
        self.embeddings.read().get(&id).cloned()
    }
}

#[async_trait]
impl BadgeCatalog for InMemoryCatalog {
    async fn list_badges(&self) -> CatalogResult<Vec<BadgeRecord>> {
        let mut badges: Vec<BadgeRecord> = self.badges.read().values().cloned().collect();
        badges.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(badges)
    }

    async fn get_badge(&self, id: BadgeId) -> CatalogResult<Option<BadgeRecord>> {
        Ok(self.badges.read().get(&id).cloned())
    }

    async fn upsert_badge(&self, badge: BadgeRecord) -> CatalogResult<()> {
        self.badges.write().insert(badge.id, badge);
        Ok(())
    }

    async fn delete_badge(&self, id: BadgeId) -> CatalogResult<bool> {
        Ok(self.badges.write().remove(&id).is_some())
    }

    async fn list_embeddings(&self) -> CatalogResult<Vec<BadgeEmbedding>> {
        Ok(self.embeddings.read().values().cloned().collect())
    }

    async fn upsert_embedding(&self, embedding: BadgeEmbedding) -> CatalogResult<()> {
        self.embeddings
            .write()
            .insert(embedding.badge_id, embedding);
        Ok(())
    }

    async fn delete_embeddings(&self, ids: &[BadgeId]) -> CatalogResult<usize> {
        let mut embeddings = self.embeddings.write();
        Ok(ids.iter().filter(|id| embeddings.remove(*id).is_some()).count())
    }
}
