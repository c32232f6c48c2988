use std::sync::Arc;

use tracing::{debug, info, warn};

use super::filter::{FilterDecision, KeywordFilter};
use super::hosting::ImageHost;
use super::provider::ReverseImageSearch;
use super::types::WebSearchHit;
use crate::image::BadgeImage;

/// What stage 2 concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebSearchOutcome {
    /// The top hit passed the keyword filter.
    Accepted(WebSearchHit),
    /// The top hit failed the filter; the whole result set is discarded.
    Rejected { decision: FilterDecision },
    NoResults,
    /// Not configured. Not an error.
    Skipped { reason: String },
    /// Upload or search call failed.
    Failed { reason: String },
}

impl WebSearchOutcome {
    /// `true` unless a hit was accepted.
    pub fn should_continue_to_ai(&self) -> bool {
        !matches!(self, WebSearchOutcome::Accepted(_))
    }

    /// The upload or the search call failed, as opposed to finding nothing usable.
    pub fn is_failure(&self) -> bool {
        matches!(self, WebSearchOutcome::Failed { .. })
    }

    pub fn hit(&self) -> Option<&WebSearchHit> {
        match self {
            WebSearchOutcome::Accepted(hit) => Some(hit),
            _ => None,
        }
    }

    pub fn into_hit(self) -> Option<WebSearchHit> {
        match self {
            WebSearchOutcome::Accepted(hit) => Some(hit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebSearchOutcome::Accepted(_) => "accepted",
            WebSearchOutcome::Rejected { .. } => "rejected",
            WebSearchOutcome::NoResults => "no_results",
            WebSearchOutcome::Skipped { .. } => "skipped",
            WebSearchOutcome::Failed { .. } => "failed",
        }
    }
}

/// Stage 2: upload, search, screen the top hit, clean up.
pub struct WebSearchStage {
    search: Option<Arc<dyn ReverseImageSearch>>,
    host: Option<Arc<dyn ImageHost>>,
    filter: KeywordFilter,
}

impl WebSearchStage {
    pub fn new(
        search: Option<Arc<dyn ReverseImageSearch>>,
        host: Option<Arc<dyn ImageHost>>,
        filter: KeywordFilter,
    ) -> Self {
        Self {
            search,
            host,
            filter,
        }
    }

    /// Both the search provider and the image host are required.
    pub fn is_configured(&self) -> bool {
        self.search.is_some() && self.host.is_some()
    }

    pub fn filter(&self) -> &KeywordFilter {
        &self.filter
    }

    pub async fn run(&self, image: &BadgeImage) -> WebSearchOutcome {
        let (Some(search), Some(host)) = (&self.search, &self.host) else {
            let reason = match (&self.search, &self.host) {
                (None, _) => "search API key not configured",
                _ => "image storage not configured",
            };
            info!(reason, "Web search stage skipped");
            return WebSearchOutcome::Skipped {
                reason: reason.to_string(),
            };
        };

        let hosted = match host.upload(image).await {
            Ok(hosted) => hosted,
            Err(e) => {
                warn!(error = %e, "Failed to upload image for web search");
                return WebSearchOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let results = search.search(&hosted.public_url).await;

        if let Err(e) = host.delete(&hosted.key).await {
            warn!(error = %e, key = %hosted.key, "Failed to delete temporary search image");
        }

        let results = match results {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "Reverse image search failed");
                return WebSearchOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let Some(top) = results.into_iter().next() else {
            debug!("Reverse image search returned no results");
            return WebSearchOutcome::NoResults;
        };

        let decision = self.filter.evaluate(&top);
        match decision {
            FilterDecision::Accepted { ref term } => {
                info!(title = %top.title, link = %top.link, term = %term, "Web search result accepted");
                WebSearchOutcome::Accepted(top.into())
            }
            _ => {
                info!(title = %top.title, link = %top.link, %decision, "Web search results rejected");
                WebSearchOutcome::Rejected { decision }
            }
        }
    }
}

impl std::fmt::Debug for WebSearchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSearchStage")
            .field("search", &self.search.is_some())
            .field("host", &self.host.is_some())
            .finish()
    }
}
