//! Embedding generation and the embedding-similarity stage of the cascade.
//!
//! - [`client`] talks to the external embeddings API.
//! - [`matcher`] compares a query embedding against the stored catalog embeddings.

pub mod client;
pub mod config;
mod error;
pub mod matcher;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use client::{EmbeddingInput, EmbeddingProvider, HttpEmbeddingClient};
pub use config::EmbeddingApiConfig;
pub use error::EmbeddingError;
pub use matcher::{EmbeddingMatcher, MatchOutcome, MatcherConfig, rank_candidates};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbeddingProvider;
