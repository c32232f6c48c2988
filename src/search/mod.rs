//! Reverse-image web search: stage 2 of the cascade.
//!
//! The search provider needs a public URL, so the photo is first pushed to temporary object
//! storage ([`hosting`]), searched ([`provider`]), and the top hit is screened by the
//! [`KeywordFilter`] before it is trusted. The upload is removed again on every path.

pub mod config;
pub mod error;
pub mod filter;
pub mod hosting;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod provider;
pub mod stage;
pub mod types;


pub use config::{ImageHostConfig, ReverseSearchConfig};
pub use error::{HostingError, SearchError};
pub use filter::{FilterDecision, KeywordFilter};
pub use hosting::{HostedImage, ImageHost, ObjectStorageHost};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockImageHost, MockReverseImageSearch};
pub use provider::{ReverseImageSearch, SerpApiClient};
pub use stage::{WebSearchOutcome, WebSearchStage};
pub use types::{ImageResult, WebSearchHit};
