use thiserror::Error;

use crate::catalog::CatalogError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Not a single stage has credentials, so no answer can ever be produced.
    #[error("no identification stage is configured (embedding, web search and vision are all missing credentials)")]
    NoStagesConfigured,

    #[error("catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),
}
