//! Merges the outputs of whichever stages ran into one [`Identification`].

use tracing::debug;

use super::types::{AnalysisResult, AnalysisSource, DatabaseMatch, Identification, sort_matches};
use crate::search::WebSearchHit;
use crate::vision::VisionAnalysis;

/// Everything the cascade produced for one image. Any subset may be empty.
#[derive(Debug, Clone, Default)]
pub struct StageResults {
    /// Stage 1 matches above the similarity floor.
    pub embedding_matches: Vec<DatabaseMatch>,
    /// Accepted stage 2 hit.
    pub web: Option<WebSearchHit>,
    pub vision: Option<VisionAnalysis>,
    /// Keyword matches over the catalog, used only when stage 1 found nothing.
    pub text_matches: Vec<DatabaseMatch>,
    /// A stage failed or fell back to a placeholder along the way.
    pub degraded: bool,
}

impl StageResults {
    pub fn is_empty(&self) -> bool {
        self.embedding_matches.is_empty()
            && self.web.is_none()
            && self.vision.is_none()
            && self.text_matches.is_empty()
    }
}

/// Combines stage outputs.
///
/// The vision answer (or, without one, the best database match) forms the base, and an accepted
/// web hit is laid over it. The primary source follows the same order: web search, then AI
/// analysis, then database. Confidence is the highest reported by a contributing stage.
pub fn combine(results: StageResults) -> Identification {
    let StageResults {
        mut embedding_matches,
        web,
        vision,
        text_matches,
        degraded,
    } = results;
    sort_matches(&mut embedding_matches);

    let mut confidence: Option<u8> = None;
    let mut bump = |value: u8| confidence = Some(confidence.map_or(value, |c| c.max(value)));

    if let Some(top) = embedding_matches.first() {
        bump(top.confidence);
    }

    let mut analysis = match (&vision, embedding_matches.first()) {
        (Some(vision), _) => {
            bump(vision.confidence);
            from_vision(vision)
        }
        (None, Some(top)) => AnalysisResult::from_badge(&top.badge, top.confidence),
        (None, None) => AnalysisResult::unknown(),
    };

    if let Some(hit) = web {
        bump(hit.confidence);
        analysis.name = hit.title;
        if !hit.snippet.trim().is_empty() {
            analysis.description = Some(hit.snippet);
        }
        analysis.link = Some(hit.link).filter(|l| !l.is_empty());
        if hit.thumbnail.is_some() {
            analysis.thumbnail = hit.thumbnail;
        }
        analysis.set_source(AnalysisSource::WebSearch);
    }

    if let Some(confidence) = confidence {
        analysis.confidence = confidence.min(100);
    }

    let mut matches = if embedding_matches.is_empty() {
        text_matches
    } else {
        embedding_matches
    };
    sort_matches(&mut matches);
    analysis.database_matches = matches.iter().map(|m| m.badge.clone()).collect();

    debug!(
        source = %analysis.source,
        confidence = analysis.confidence,
        matches = matches.len(),
        degraded,
        "Combined stage results"
    );

    Identification {
        analysis,
        matches,
        degraded,
    }
}

fn from_vision(vision: &VisionAnalysis) -> AnalysisResult {
    let mut result = AnalysisResult::new(
        vision.name.clone(),
        vision.confidence,
        AnalysisSource::AiAnalysis,
    );
    result.description = vision.description.clone();
    result.maker = vision.maker.clone();
    result.category = vision.category.clone();
    result.year = vision.year;
    result
}
