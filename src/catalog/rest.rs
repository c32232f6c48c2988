use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::{CatalogError, CatalogResult};
use super::model::{BadgeEmbedding, BadgeId, BadgeRecord};
use super::store::BadgeCatalog;
use super::{BADGES_TABLE, EMBEDDINGS_TABLE};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

/// Catalog backed by a PostgREST-style HTTP API (`/rest/v1/<table>`).
#[derive(Clone)]
pub struct RestCatalog {
    http: Client,
    base_url: String,
}

impl std::fmt::Debug for RestCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestCatalog")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RestCatalog {
    pub fn new(url: &str, api_key: Option<&str>) -> CatalogResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            let bearer = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                CatalogError::RequestFailed {
                    reason: format!("invalid catalog key: {e}"),
                }
            })?;
            let raw = HeaderValue::from_str(key).map_err(|e| CatalogError::RequestFailed {
                reason: format!("invalid catalog key: {e}"),
            })?;
            headers.insert(AUTHORIZATION, bearer);
            headers.insert("apikey", raw);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: format!("{}/rest/v1", url.trim_end_matches('/')),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> CatalogResult<Vec<T>> {
        let resp = self
            .http
            .get(self.table_url(table))
            .query(query)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.json::<Vec<T>>().await?)
    }

    async fn upsert<T: serde::Serialize + Sync>(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &[T],
    ) -> CatalogResult<()> {
        let resp = self
            .http
            .post(self.table_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", UPSERT_PREFER)
            .json(rows)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    /// Deletes rows matching `filter` and returns how many were removed.
    async fn delete_where(&self, table: &str, column: &str, filter: String) -> CatalogResult<usize> {
        let resp = self
            .http
            .delete(self.table_url(table))
            .query(&[(column, filter)])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let removed: Vec<serde_json::Value> = resp.json().await?;
        Ok(removed.len())
    }
}

async fn ensure_success(resp: Response) -> CatalogResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(CatalogError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl BadgeCatalog for RestCatalog {
    async fn is_ready(&self) -> bool {
        self.fetch::<serde_json::Value>(BADGES_TABLE, &[("select", "id".into()), ("limit", "1".into())])
            .await
            .is_ok()
    }

    async fn list_badges(&self) -> CatalogResult<Vec<BadgeRecord>> {
        self.fetch(BADGES_TABLE, &[("select", "*".into()), ("order", "name.asc".into())])
            .await
    }

    async fn get_badge(&self, id: BadgeId) -> CatalogResult<Option<BadgeRecord>> {
        let mut rows: Vec<BadgeRecord> = self
            .fetch(BADGES_TABLE, &[("select", "*".into()), ("id", format!("eq.{id}"))])
            .await?;
        Ok(rows.pop())
    }

    async fn upsert_badge(&self, badge: BadgeRecord) -> CatalogResult<()> {
        debug!(badge_id = %badge.id, "Upserting badge");
        self.upsert(BADGES_TABLE, "id", &[badge]).await
    }

    async fn delete_badge(&self, id: BadgeId) -> CatalogResult<bool> {
        let removed = self.delete_where(BADGES_TABLE, "id", format!("eq.{id}")).await?;
        Ok(removed > 0)
    }

    async fn list_embeddings(&self) -> CatalogResult<Vec<BadgeEmbedding>> {
        self.fetch(
            EMBEDDINGS_TABLE,
            &[("select", "badge_id,embedding,model,updated_at".into())],
        )
        .await
    }

    async fn upsert_embedding(&self, embedding: BadgeEmbedding) -> CatalogResult<()> {
        debug!(
            badge_id = %embedding.badge_id,
            dim = embedding.dimension(),
            "Upserting badge embedding"
        );
        self.upsert(EMBEDDINGS_TABLE, "badge_id", &[embedding]).await
    }

    async fn delete_embeddings(&self, ids: &[BadgeId]) -> CatalogResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.delete_where(EMBEDDINGS_TABLE, "badge_id", format!("in.({list})"))
            .await
    }
}
