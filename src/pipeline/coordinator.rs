use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::error::PipelineError;
use super::text::{TextMatchConfig, rank_by_text};
use crate::analysis::{DatabaseMatch, Identification, StageResults, combine};
use crate::catalog::BadgeCatalog;
use crate::embedding::EmbeddingMatcher;
use crate::hashing::short_fingerprint;
use crate::image::BadgeImage;
use crate::search::WebSearchStage;
use crate::vision::VisionStage;

/// One step of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Embedding,
    WebSearch,
    Vision,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Embedding => "embedding",
            Stage::WebSearch => "web_search",
            Stage::Vision => "vision",
        }
    }
}

const FULL_PLAN: &[Stage] = &[Stage::Embedding, Stage::WebSearch, Stage::Vision];
const FORCED_WEB_PLAN: &[Stage] = &[Stage::WebSearch, Stage::Vision];

/// Stage order for a request. Forcing web search drops the embedding stage.
pub fn stage_plan(force_web_search: bool) -> &'static [Stage] {
    if force_web_search {
        FORCED_WEB_PLAN
    } else {
        FULL_PLAN
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentifyOptions {
    pub force_web_search: bool,
}

/// Which stages have the credentials they need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageReadiness {
    pub embedding: bool,
    pub web_search: bool,
    pub vision: bool,
}

impl StageReadiness {
    pub fn any(&self) -> bool {
        self.embedding || self.web_search || self.vision
    }
}

enum StageFlow {
    Continue,
    Done,
}

/// Runs the cascade for one image at a time. Holds no per-request state.
pub struct IdentificationPipeline {
    matcher: EmbeddingMatcher,
    web: WebSearchStage,
    vision: VisionStage,
    catalog: Arc<dyn BadgeCatalog>,
    text: TextMatchConfig,
}

impl IdentificationPipeline {
    pub fn new(
        matcher: EmbeddingMatcher,
        web: WebSearchStage,
        vision: VisionStage,
        catalog: Arc<dyn BadgeCatalog>,
        text: TextMatchConfig,
    ) -> Self {
        Self {
            matcher,
            web,
            vision,
            catalog,
            text,
        }
    }

    pub fn readiness(&self) -> StageReadiness {
        StageReadiness {
            embedding: self.matcher.is_configured(),
            web_search: self.web.is_configured(),
            vision: self.vision.is_configured(),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn BadgeCatalog> {
        &self.catalog
    }

    /// Identifies the badge in `image`.
    ///
    /// Only fails when no stage is configured at all; every other outcome, including "nothing
    /// found", is an [`Identification`].
    #[instrument(skip(self, image), fields(image = %short_fingerprint(image.hash()), force_web_search = options.force_web_search))]
    pub async fn identify(
        &self,
        image: &BadgeImage,
        options: IdentifyOptions,
    ) -> Result<Identification, PipelineError> {
        if !self.readiness().any() {
            return Err(PipelineError::NoStagesConfigured);
        }

        let mut results = StageResults::default();

        for stage in stage_plan(options.force_web_search) {
            let flow = self.run_stage(*stage, image, &mut results).await;
            if let StageFlow::Done = flow {
                debug!(stage = stage.as_str(), "Cascade settled");
                break;
            }
        }

        if results.embedding_matches.is_empty() {
            match self.text_fallback(&results).await {
                Some(matches) => results.text_matches = matches,
                None => results.degraded = true,
            }
        }

        let identification = combine(results);
        info!(
            source = %identification.analysis.source,
            confidence = identification.analysis.confidence,
            matches = identification.matches.len(),
            degraded = identification.degraded,
            "Identification complete"
        );
        Ok(identification)
    }

    async fn run_stage(
        &self,
        stage: Stage,
        image: &BadgeImage,
        results: &mut StageResults,
    ) -> StageFlow {
        match stage {
            Stage::Embedding => {
                let outcome = self.matcher.run(image).await;
                results.degraded |= outcome.failed;
                results.embedding_matches = outcome.matches;
                if results.embedding_matches.is_empty() {
                    StageFlow::Continue
                } else {
                    StageFlow::Done
                }
            }
            Stage::WebSearch => {
                let outcome = self.web.run(image).await;
                debug!(outcome = outcome.as_str(), "Web search stage finished");
                results.degraded |= outcome.is_failure();
                match outcome.into_hit() {
                    Some(hit) => {
                        results.web = Some(hit);
                        StageFlow::Done
                    }
                    None => StageFlow::Continue,
                }
            }
            Stage::Vision => {
                results.vision = self.vision.analyze(image).await;
                results.degraded |= results.vision.as_ref().is_some_and(|v| v.placeholder);
                StageFlow::Done
            }
        }
    }

    /// Keyword matches for the name a later stage came up with. `None` when the catalog could
    /// not be read.
    async fn text_fallback(&self, results: &StageResults) -> Option<Vec<DatabaseMatch>> {
        let name = match (&results.web, &results.vision) {
            (Some(hit), _) => hit.title.as_str(),
            (None, Some(vision)) if !vision.placeholder => vision.name.as_str(),
            _ => return Some(Vec::new()),
        };

        match self.catalog.list_badges().await {
            Ok(badges) => {
                let matches = rank_by_text(name, badges, &self.text);
                debug!(query = %name, matches = matches.len(), "Text fallback ranked catalog");
                Some(matches)
            }
            Err(e) => {
                warn!(error = %e, "Text fallback could not read the catalog");
                None
            }
        }
    }

    /// Direct keyword search over the catalog.
    pub async fn search_catalog(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<DatabaseMatch>, PipelineError> {
        let badges = self.catalog.list_badges().await?;
        let config = TextMatchConfig {
            top_k: limit.unwrap_or(self.text.top_k).max(1),
            ..self.text.clone()
        };
        Ok(rank_by_text(query, badges, &config))
    }
}

impl std::fmt::Debug for IdentificationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentificationPipeline")
            .field("matcher", &self.matcher)
            .field("web", &self.web)
            .field("vision", &self.vision)
            .field("text", &self.text)
            .finish()
    }
}
