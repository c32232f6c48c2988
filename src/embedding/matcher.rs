use std::sync::Arc;

use tracing::{debug, info, warn};

use super::client::{EmbeddingInput, EmbeddingProvider};
use crate::analysis::DatabaseMatch;
use crate::analysis::types::sort_matches;
use crate::catalog::{BadgeCatalog, BadgeEmbedding, BadgeRecord};
use crate::config::env;
use crate::constants::{DEFAULT_SIMILARITY_FLOOR, DEFAULT_TOP_K, match_confidence};
use crate::image::BadgeImage;
use crate::similarity::cosine_similarity;

/// Ranking knobs for the embedding stage.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    /// Candidates below this cosine similarity are dropped.
    pub similarity_floor: f32,
    /// Max matches returned.
    pub top_k: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            similarity_floor: DEFAULT_SIMILARITY_FLOOR,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl MatcherConfig {
    pub const ENV_SIMILARITY_FLOOR: &'static str = "BADGELIFE_SIMILARITY_FLOOR";
    pub const ENV_TOP_K: &'static str = "BADGELIFE_TOP_K";

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            similarity_floor: env::parse_or(Self::ENV_SIMILARITY_FLOOR, defaults.similarity_floor),
            top_k: env::parse_or(Self::ENV_TOP_K, defaults.top_k),
        }
    }
}

/// Stage 1: compares the photo's embedding with every stored badge embedding.
pub struct EmbeddingMatcher {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    catalog: Arc<dyn BadgeCatalog>,
    config: MatcherConfig,
}

impl std::fmt::Debug for EmbeddingMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingMatcher")
            .field(
                "provider",
                &self.provider.as_ref().map(|p| p.model_name().to_string()),
            )
            .field("config", &self.config)
            .finish()
    }
}

impl EmbeddingMatcher {
    pub fn new(
        provider: Option<Arc<dyn EmbeddingProvider>>,
        catalog: Arc<dyn BadgeCatalog>,
        config: MatcherConfig,
    ) -> Self {
        Self {
            provider,
            catalog,
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Returns ranked matches for `image`.
    ///
    /// Never fails: an unconfigured provider, an embedding error or a catalog error all yield an
    /// empty list so the cascade can move on.
    pub async fn find_matches(&self, image: &BadgeImage) -> Vec<DatabaseMatch> {
        self.run(image).await.matches
    }

    /// Like [`find_matches`](Self::find_matches), but also reports whether a provider or catalog
    /// call failed.
    pub async fn run(&self, image: &BadgeImage) -> MatchOutcome {
        let Some(provider) = &self.provider else {
            debug!("Embedding stage skipped: no embedding provider configured");
            return MatchOutcome::default();
        };

        let query = match provider.embed(EmbeddingInput::Image(image)).await {
            Ok(query) => query,
            Err(e) => {
                warn!(error = %e, "Embedding stage failed, continuing without database matches");
                return MatchOutcome::failed();
            }
        };

        let candidates = match self.catalog.embedded_badges().await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Failed to load badge embeddings, continuing without database matches");
                return MatchOutcome::failed();
            }
        };

        let total = candidates.len();
        let matches = rank_candidates(&query, candidates, &self.config);

        info!(
            candidates = total,
            matches = matches.len(),
            top_similarity = matches.first().map(|m| m.similarity),
            "Embedding stage complete"
        );

        MatchOutcome {
            matches,
            failed: false,
        }
    }
}

/// Result of one stage 1 run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub matches: Vec<DatabaseMatch>,
    /// The provider or the catalog call failed.
    pub failed: bool,
}

impl MatchOutcome {
    fn failed() -> Self {
        Self {
            matches: Vec::new(),
            failed: true,
        }
    }
}

/// Scores `candidates` against `query` with cosine similarity.
///
/// Embeddings whose dimension differs from the query are excluded, scores under the floor are
/// dropped, and the rest is sorted descending and cut to `top_k`.
pub fn rank_candidates(
    query: &[f32],
    candidates: Vec<(BadgeRecord, BadgeEmbedding)>,
    config: &MatcherConfig,
) -> Vec<DatabaseMatch> {
    if query.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<DatabaseMatch> = candidates
        .into_iter()
        .filter_map(|(badge, embedding)| {
            if embedding.dimension() != query.len() {
                warn!(
                    badge_id = %badge.id,
                    expected_dim = query.len(),
                    actual_dim = embedding.dimension(),
                    "Dropping candidate: embedding dimension mismatch"
                );
                return None;
            }

            let similarity = cosine_similarity(query, &embedding.embedding);
            if similarity < config.similarity_floor {
                return None;
            }

            Some(DatabaseMatch::new(
                badge,
                similarity,
                match_confidence(similarity),
            ))
        })
        .collect();

    sort_matches(&mut matches);
    matches.truncate(config.top_k);
    matches
}
