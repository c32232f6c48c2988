use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::client::VisionModel;
use super::error::VisionError;
use crate::image::BadgeImage;

/// Vision model that returns a fixed reply.
#[derive(Debug)]
pub struct MockVisionModel {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl MockVisionModel {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replies with a well-formed JSON answer.
    pub fn identifying(name: &str, confidence: u8) -> Self {
        Self::replying(
            serde_json::json!({
                "name": name,
                "description": format!("{name} as seen by the mock model"),
                "maker": null,
                "category": "Electronic Badge",
                "confidence": confidence,
            })
            .to_string(),
        )
    }

    pub fn failing() -> Self {
        Self {
            reply: Err("mock vision model configured to fail".to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionModel for MockVisionModel {
    fn model_name(&self) -> &str {
        "mock-vision"
    }

    async fn describe(&self, _image: &BadgeImage) -> Result<String, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map_err(|reason| VisionError::RequestFailed { reason })
    }
}
