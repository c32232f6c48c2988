use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{HostingError, SearchError};
use super::hosting::{HostedImage, ImageHost};
use super::provider::ReverseImageSearch;
use super::types::ImageResult;
use crate::image::BadgeImage;

/// Search provider returning canned results.
#[derive(Debug, Default)]
pub struct MockReverseImageSearch {
    results: Vec<ImageResult>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl MockReverseImageSearch {
    pub fn new(results: Vec<ImageResult>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().len()
    }

    /// Image URLs searched so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl ReverseImageSearch for MockReverseImageSearch {
    async fn search(&self, image_url: &str) -> Result<Vec<ImageResult>, SearchError> {
        self.queries.lock().push(image_url.to_string());
        if self.fail {
            return Err(SearchError::RequestFailed {
                reason: "mock search configured to fail".to_string(),
            });
        }
        Ok(self.results.clone())
    }
}

/// Image host that records uploads and deletes.
#[derive(Debug, Default)]
pub struct MockImageHost {
    fail_upload: bool,
    uploads: AtomicUsize,
    deleted: Mutex<Vec<String>>,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_upload() -> Self {
        Self {
            fail_upload: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    async fn upload(&self, image: &BadgeImage) -> Result<HostedImage, HostingError> {
        if self.fail_upload {
            return Err(HostingError::UploadFailed {
                reason: "mock host configured to fail".to_string(),
            });
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        let key = format!("searches/mock/{n}.{}", image.extension());
        Ok(HostedImage {
            public_url: format!("https://storage.mock/{key}"),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), HostingError> {
        self.deleted.lock().push(key.to_string());
        Ok(())
    }
}
