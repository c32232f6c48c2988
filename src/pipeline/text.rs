//! Keyword-overlap matching over the catalog, the last-resort search path.

use crate::analysis::DatabaseMatch;
use crate::analysis::types::sort_matches;
use crate::catalog::BadgeRecord;
use crate::constants::{DEFAULT_TEXT_MATCH_FLOOR, DEFAULT_TOP_K, clamp_confidence};
use crate::similarity::text_similarity;

#[derive(Debug, Clone, PartialEq)]
pub struct TextMatchConfig {
    /// Minimum Jaccard similarity for a badge to count as a match.
    pub floor: f32,
    pub top_k: usize,
}

impl Default for TextMatchConfig {
    fn default() -> Self {
        Self {
            floor: DEFAULT_TEXT_MATCH_FLOOR,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Ranks `badges` by [`text_similarity`] between `query` and each badge's search label.
pub fn rank_by_text(
    query: &str,
    badges: Vec<BadgeRecord>,
    config: &TextMatchConfig,
) -> Vec<DatabaseMatch> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<DatabaseMatch> = badges
        .into_iter()
        .filter_map(|badge| {
            let similarity = text_similarity(query, &badge.search_label());
            (similarity > 0.0 && similarity >= config.floor).then(|| {
                DatabaseMatch::new(badge, similarity, clamp_confidence(similarity * 100.0))
            })
        })
        .collect();

    sort_matches(&mut matches);
    matches.truncate(config.top_k);
    matches
}
