//! Vision-model fallback: stage 3 of the cascade.
//!
//! The photo goes to a chat-completions vision model with a prompt that asks for a single JSON
//! object. The first balanced `{...}` block of the reply is parsed; anything unusable becomes the
//! low-confidence placeholder, so this stage always yields an answer once it runs.

pub mod client;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod parse;
pub mod stage;

#[cfg(test)]
mod tests;

pub use client::{ChatVisionClient, VisionModel};
pub use config::VisionConfig;
pub use error::VisionError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockVisionModel;
pub use parse::{VisionAnalysis, extract_json_object, parse_analysis};
pub use stage::VisionStage;

/// Instructions sent with every photo.
pub const SYSTEM_PROMPT: &str = "You are an expert on electronic conference badges \
(DEF CON, Hackaday Supercon, BSides, #badgelife and similar hacker-culture hardware). \
Identify the badge in the photo. Reply with exactly one JSON object and nothing else, \
using these keys: \"name\" (string), \"description\" (string), \"maker\" (string or null), \
\"category\" (string or null), \"year\" (number or null), and \"confidence\" (integer 0-100 \
describing how sure you are). If you cannot identify the badge, describe what you see and \
use a low confidence.";

pub const USER_PROMPT: &str = "Identify this badge.";
