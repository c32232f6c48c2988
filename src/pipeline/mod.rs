//! The identification cascade.
//!
//! Stages run strictly in order and each one either settles the identification or hands over to
//! the next. Stage failures never surface here as errors; they arrive as empty or placeholder
//! results and mark the identification as degraded.

pub mod coordinator;
pub mod error;
pub mod text;


pub use coordinator::{IdentificationPipeline, IdentifyOptions, Stage, StageReadiness, stage_plan};
pub use error::PipelineError;
pub use text::{TextMatchConfig, rank_by_text};
