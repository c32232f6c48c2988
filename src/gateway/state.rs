use std::sync::Arc;

use crate::cache::ResultCache;
use crate::catalog::CatalogMaintenance;
use crate::pipeline::IdentificationPipeline;

#[derive(Clone)]
pub struct HandlerState {
    pub pipeline: Arc<IdentificationPipeline>,

    pub maintenance: Arc<CatalogMaintenance>,

    pub cache: Arc<ResultCache>,

    /// Largest accepted decoded image.
    pub max_image_bytes: usize,
}

impl HandlerState {
    pub fn new(
        pipeline: Arc<IdentificationPipeline>,
        maintenance: Arc<CatalogMaintenance>,
        cache: Arc<ResultCache>,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            pipeline,
            maintenance,
            cache,
            max_image_bytes,
        }
    }

    /// Request body cap: base64 inflates by 4/3, plus room for the JSON envelope.
    pub fn body_limit(&self) -> usize {
        self.max_image_bytes
            .saturating_mul(4)
            .div_ceil(3)
            .saturating_add(64 * 1024)
    }
}
