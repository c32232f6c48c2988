use std::collections::HashMap;

use async_trait::async_trait;

use super::error::CatalogResult;
use super::model::{BadgeEmbedding, BadgeId, BadgeRecord};

#[async_trait]
/// CRUD surface of the badge catalog.
pub trait BadgeCatalog: Send + Sync {
    /// Returns `true` if the store can serve requests.
    async fn is_ready(&self) -> bool {
        true
    }

    async fn list_badges(&self) -> CatalogResult<Vec<BadgeRecord>>;

    async fn get_badge(&self, id: BadgeId) -> CatalogResult<Option<BadgeRecord>>;

    /// Inserts or replaces a badge by id.
    async fn upsert_badge(&self, badge: BadgeRecord) -> CatalogResult<()>;

    /// Hard-deletes a badge. Returns `false` if it did not exist.
    async fn delete_badge(&self, id: BadgeId) -> CatalogResult<bool>;

    async fn list_embeddings(&self) -> CatalogResult<Vec<BadgeEmbedding>>;

    /// Inserts or replaces the embedding of `embedding.badge_id` (last writer wins).
    async fn upsert_embedding(&self, embedding: BadgeEmbedding) -> CatalogResult<()>;

    /// Deletes the embeddings of `ids`. Returns how many were removed.
    async fn delete_embeddings(&self, ids: &[BadgeId]) -> CatalogResult<usize>;

    /// Badges joined with their embeddings. Orphaned embeddings and badges without an
    /// embedding are left out.
    async fn embedded_badges(&self) -> CatalogResult<Vec<(BadgeRecord, BadgeEmbedding)>> {
        let embeddings = self.list_embeddings().await?;
        if embeddings.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id: HashMap<BadgeId, BadgeRecord> = self
            .list_badges()
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(embeddings
            .into_iter()
            .filter_map(|e| by_id.remove(&e.badge_id).map(|b| (b, e)))
            .collect())
    }
}
