//! Identification results and the combiner that merges stage outputs into one answer.

pub mod combiner;
pub mod types;


pub use combiner::{StageResults, combine};
pub use types::{AnalysisResult, AnalysisSource, DatabaseMatch, Identification};
