use std::sync::Arc;

use tracing::{debug, info, warn};

use super::client::VisionModel;
use super::parse::{VisionAnalysis, parse_analysis};
use crate::image::BadgeImage;

/// Stage 3: the terminal fallback.
pub struct VisionStage {
    model: Option<Arc<dyn VisionModel>>,
}

impl VisionStage {
    pub fn new(model: Option<Arc<dyn VisionModel>>) -> Self {
        Self { model }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    /// `None` only when no model is configured. Call or parse failures give the placeholder.
    pub async fn analyze(&self, image: &BadgeImage) -> Option<VisionAnalysis> {
        let Some(model) = &self.model else {
            debug!("Vision stage skipped: no vision model configured");
            return None;
        };

        let text = match model.describe(image).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, model = model.model_name(), "Vision call failed, using placeholder");
                return Some(VisionAnalysis::placeholder());
            }
        };

        match parse_analysis(&text) {
            Ok(analysis) => {
                info!(
                    name = %analysis.name,
                    confidence = analysis.confidence,
                    "Vision stage identified badge"
                );
                Some(analysis)
            }
            Err(e) => {
                warn!(error = %e, "Unparsable vision answer, using placeholder");
                Some(VisionAnalysis::placeholder())
            }
        }
    }
}

impl std::fmt::Debug for VisionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionStage")
            .field("model", &self.model.as_ref().map(|m| m.model_name().to_string()))
            .finish()
    }
}
