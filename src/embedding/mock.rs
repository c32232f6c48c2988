use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::client::{EmbeddingInput, EmbeddingProvider};
use super::error::EmbeddingError;
use crate::hashing::hash_bytes;
use crate::similarity::normalize_vector;

pub const MOCK_EMBEDDING_DIM: usize = 8;

/// Deterministic in-process embedding provider.
///
/// Text without an explicit vector gets a hash-derived one; images return the configured image
/// vector (or a hash-derived one).
#[derive(Debug, Default)]
pub struct MockEmbeddingProvider {
    image_vector: RwLock<Option<Vec<f32>>>,
    text_vectors: RwLock<HashMap<String, Vec<f32>>>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every call fails like an unreachable API.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_image_vector(self, vector: Vec<f32>) -> Self {
        *self.image_vector.write() = Some(vector);
        self
    }

    pub fn with_text_vector(self, text: &str, vector: Vec<f32>) -> Self {
        self.text_vectors.write().insert(text.to_string(), vector);
        self
    }

    pub fn set_image_vector(&self, vector: Vec<f32>) {
        *self.image_vector.write() = Some(vector);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Hash-derived vector so different inputs land in different directions.
pub fn deterministic_vector(data: &[u8]) -> Vec<f32> {
    let hash = hash_bytes(data);
    hash[..MOCK_EMBEDDING_DIM]
        .iter()
        .map(|b| *b as f32 / 255.0 + 0.01)
        .collect()
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn model_name(&self) -> &str {
        "mock-embedding"
    }

    async fn embed(&self, input: EmbeddingInput<'_>) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(EmbeddingError::RequestFailed {
                reason: "mock embedding provider configured to fail".to_string(),
            });
        }

        let raw = match input {
            EmbeddingInput::Text(text) => self
                .text_vectors
                .read()
                .get(text)
                .cloned()
                .unwrap_or_else(|| deterministic_vector(text.as_bytes())),
            EmbeddingInput::Image(image) => self
                .image_vector
                .read()
                .clone()
                .unwrap_or_else(|| deterministic_vector(image.bytes())),
        };

        normalize_vector(&raw).ok_or_else(|| EmbeddingError::MalformedVector {
            reason: "mock vector is empty or zero".to_string(),
        })
    }
}
