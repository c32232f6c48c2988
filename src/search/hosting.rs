use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::config::ImageHostConfig;
use super::error::HostingError;
use crate::image::BadgeImage;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// A temporarily hosted image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    /// Object key, used to delete the upload.
    pub key: String,
    pub public_url: String,
}

#[async_trait]
/// Temporary public hosting for search uploads.
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: &BadgeImage) -> Result<HostedImage, HostingError>;

    async fn delete(&self, key: &str) -> Result<(), HostingError>;
}

/// Object key for a search upload: `searches/<date>/<uuid>.<ext>`.
pub fn upload_key(image: &BadgeImage) -> String {
    format!(
        "searches/{}/{}.{}",
        Utc::now().format("%Y-%m-%d"),
        Uuid::new_v4(),
        image.extension()
    )
}

/// Supabase-style storage API (`/storage/v1/object/...`) with a public bucket.
#[derive(Clone)]
pub struct ObjectStorageHost {
    http: Client,
    base_url: String,
    bucket: String,
}

impl std::fmt::Debug for ObjectStorageHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorageHost")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl ObjectStorageHost {
    pub fn new(config: &ImageHostConfig) -> Result<Self, HostingError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| HostingError::InvalidConfig {
                reason: "missing storage URL".to_string(),
            })?;
        let key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| HostingError::InvalidConfig {
                reason: "missing storage key".to_string(),
            })?;

        let invalid_key = |e: reqwest::header::InvalidHeaderValue| HostingError::InvalidConfig {
            reason: format!("invalid storage key: {e}"),
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid_key)?,
        );
        headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid_key)?);

        let http = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| HostingError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: format!("{}/storage/v1", url.trim_end_matches('/')),
            bucket: config.bucket.clone(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/object/{}/{}", self.base_url, self.bucket, key)
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, key)
    }
}

#[async_trait]
impl ImageHost for ObjectStorageHost {
    async fn upload(&self, image: &BadgeImage) -> Result<HostedImage, HostingError> {
        let key = upload_key(image);
        let resp = self
            .http
            .post(self.object_url(&key))
            .header(CONTENT_TYPE, image.mime_type())
            .header("x-upsert", "true")
            .body(image.bytes().to_vec())
            .send()
            .await
            .map_err(|e| HostingError::UploadFailed {
                reason: e.to_string(),
            })?;
        ensure_success(resp).await?;

        debug!(key = %key, bytes = image.len(), "Uploaded search image");
        Ok(HostedImage {
            public_url: self.public_url(&key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), HostingError> {
        let resp = self
            .http
            .delete(format!("{}/object/{}", self.base_url, self.bucket))
            .json(&serde_json::json!({ "prefixes": [key] }))
            .send()
            .await
            .map_err(|e| HostingError::DeleteFailed {
                reason: e.to_string(),
            })?;
        ensure_success(resp).await?;
        debug!(key = %key, "Deleted search image");
        Ok(())
    }
}

async fn ensure_success(resp: Response) -> Result<Response, HostingError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(HostingError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}
