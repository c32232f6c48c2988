use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::error::{CatalogError, CatalogResult};
use super::model::{BadgeEmbedding, BadgeId, BadgeRecord, descriptor_text};
use super::store::BadgeCatalog;
use crate::cache::ResultCache;
use crate::embedding::{EmbeddingInput, EmbeddingProvider};

/// Outcome of [`CatalogMaintenance::prune_orphans`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub scanned: usize,
    pub removed: usize,
}

/// Outcome of [`CatalogMaintenance::update_badge`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeUpdate {
    pub badge: BadgeRecord,
    pub descriptor_changed: bool,
    pub embedding_regenerated: bool,
}

/// Keeps badge embeddings in step with the badges they describe.
///
/// Every mutation clears the result cache, since cached identifications may reference the old
/// catalog state.
#[derive(Clone)]
pub struct CatalogMaintenance {
    catalog: Arc<dyn BadgeCatalog>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    cache: Option<Arc<ResultCache>>,
}

impl CatalogMaintenance {
    pub fn new(
        catalog: Arc<dyn BadgeCatalog>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Self {
        Self {
            catalog,
            embedder,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn catalog(&self) -> &Arc<dyn BadgeCatalog> {
        &self.catalog
    }

    /// Embeds the badge's descriptor text and stores it, replacing any previous embedding.
    pub async fn regenerate_embedding(&self, id: BadgeId) -> CatalogResult<BadgeEmbedding> {
        let badge = self
            .catalog
            .get_badge(id)
            .await?
            .ok_or(CatalogError::BadgeNotFound { id })?;

        let embedding = self.embed_badge(&badge).await?;
        self.catalog.upsert_embedding(embedding.clone()).await?;
        self.invalidate_cache();

        info!(
            badge_id = %id,
            dim = embedding.dimension(),
            model = embedding.model.as_deref(),
            "Regenerated badge embedding"
        );
        Ok(embedding)
    }

    /// Stores `record`. The embedding is regenerated only when the descriptor text changed.
    ///
    /// The new embedding is computed before anything is written, so a failed embedding call
    /// leaves both the badge and its embedding untouched and a retry sees the change again.
    pub async fn update_badge(&self, mut record: BadgeRecord) -> CatalogResult<BadgeUpdate> {
        let previous = self.catalog.get_badge(record.id).await?;
        let descriptor_changed = previous
            .as_ref()
            .is_none_or(|p| descriptor_text(p) != descriptor_text(&record));

        if let Some(prev) = &previous {
            record.created_at = record.created_at.or(prev.created_at);
        }
        record.updated_at = Some(Utc::now());

        let id = record.id;
        let embedding = if !descriptor_changed {
            None
        } else if self.embedder.is_none() {
            warn!(badge_id = %id, "Descriptor changed but no embedding provider is configured");
            None
        } else {
            Some(self.embed_badge(&record).await?)
        };

        self.catalog.upsert_badge(record.clone()).await?;
        let embedding_regenerated = match embedding {
            Some(embedding) => {
                self.catalog.upsert_embedding(embedding).await?;
                true
            }
            None => false,
        };
        self.invalidate_cache();

        info!(
            badge_id = %id,
            descriptor_changed,
            embedding_regenerated,
            "Updated badge"
        );
        Ok(BadgeUpdate {
            badge: record,
            descriptor_changed,
            embedding_regenerated,
        })
    }

    async fn embed_badge(&self, badge: &BadgeRecord) -> CatalogResult<BadgeEmbedding> {
        let id = badge.id;
        let embedder = self
            .embedder
            .as_ref()
            .ok_or_else(|| CatalogError::EmbeddingUnavailable {
                id,
                reason: "no embedding provider configured".to_string(),
            })?;

        let text = descriptor_text(badge);
        let vector = embedder
            .embed(EmbeddingInput::Text(&text))
            .await
            .map_err(|e| CatalogError::EmbeddingUnavailable {
                id,
                reason: e.to_string(),
            })?;

        Ok(BadgeEmbedding::new(id, vector).with_model(embedder.model_name()))
    }

    /// Hard-deletes a badge and its embedding. Returns `false` if the badge did not exist.
    pub async fn delete_badge(&self, id: BadgeId) -> CatalogResult<bool> {
        let removed = self.catalog.delete_badge(id).await?;
        let embeddings = self.catalog.delete_embeddings(&[id]).await?;
        self.invalidate_cache();

        info!(badge_id = %id, removed, embeddings, "Deleted badge");
        Ok(removed)
    }

    /// Deletes embeddings whose badge no longer exists.
    pub async fn prune_orphans(&self) -> CatalogResult<PruneReport> {
        let badge_ids: HashSet<BadgeId> = self
            .catalog
            .list_badges()
            .await?
            .into_iter()
            .map(|b| b.id)
            .collect();

        let embeddings = self.catalog.list_embeddings().await?;
        let scanned = embeddings.len();
        let orphans: Vec<BadgeId> = embeddings
            .into_iter()
            .map(|e| e.badge_id)
            .filter(|id| !badge_ids.contains(id))
            .collect();

        let removed = if orphans.is_empty() {
            0
        } else {
            let removed = self.catalog.delete_embeddings(&orphans).await?;
            self.invalidate_cache();
            removed
        };

        info!(scanned, removed, "Pruned orphaned embeddings");
        Ok(PruneReport { scanned, removed })
    }

    fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}

impl std::fmt::Debug for CatalogMaintenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogMaintenance")
            .field("embedder", &self.embedder.is_some())
            .field("cache", &self.cache.is_some())
            .finish()
    }
}
