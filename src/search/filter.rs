//! Blocklist/allowlist screening of reverse-image search hits.
//!
//! Term lists are data: the built-in defaults can be replaced with a JSON file of the form
//! `{"blocklist": [...], "allowlist": [...]}`. Matching is case-insensitive substring search over
//! [`ImageResult::combined_text`].

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::SearchError;
use super::types::ImageResult;

/// Entertainment and encyclopedia signals. Badge art often borrows pop-culture imagery, and
/// these hits describe the franchise, not the badge.
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "fandom.com",
    "wikia",
    "wikipedia",
    "wookieepedia",
    "memory-alpha",
    "imdb.com",
    "star wars",
    "star trek",
    "marvel",
    "disney",
    "pokemon",
    "pokémon",
    "movie",
    "film",
    "character",
    "action figure",
];

/// Badge-domain terms. At least one must be present for a hit to be trusted.
pub const DEFAULT_ALLOWLIST: &[&str] = &[
    "badgelife",
    "conference badge",
    "con badge",
    "defcon badge",
    "def con badge",
    "dc badge",
    "electronic badge",
    "hacker badge",
    "led badge",
    "badge pcb",
    "pcb badge",
    "badge kit",
    "shitty add-on",
    "shitty addon",
    "hackaday",
    "supercon",
    "tindie",
];

/// Verdict on one search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Accepted { term: String },
    Blocked { term: String },
    NoAllowlistMatch,
}

impl FilterDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FilterDecision::Accepted { .. })
    }
}

impl std::fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterDecision::Accepted { term } => write!(f, "accepted (matched {term:?})"),
            FilterDecision::Blocked { term } => write!(f, "blocked (matched {term:?})"),
            FilterDecision::NoAllowlistMatch => f.write_str("no badge term found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordFilter {
    #[serde(default)]
    blocklist: Vec<String>,
    #[serde(default)]
    allowlist: Vec<String>,
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_BLOCKLIST.iter().copied(),
            DEFAULT_ALLOWLIST.iter().copied(),
        )
    }
}

impl KeywordFilter {
    /// Builds a filter; terms are trimmed, lowercased and blanks dropped.
    pub fn new<B, A>(blocklist: B, allowlist: A) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        Self {
            blocklist: normalize_terms(blocklist),
            allowlist: normalize_terms(allowlist),
        }
    }

    /// Loads term lists from a JSON file. A list missing from the file keeps its default.
    pub fn from_file(path: &Path) -> Result<Self, SearchError> {
        #[derive(Deserialize)]
        struct FilterFile {
            blocklist: Option<Vec<String>>,
            allowlist: Option<Vec<String>>,
        }

        let load_err = |reason: String| SearchError::FilterLoadFailed {
            path: path.to_path_buf(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let file: FilterFile = serde_json::from_str(&raw).map_err(|e| load_err(e.to_string()))?;

        let defaults = Self::default();
        let filter = Self {
            blocklist: file
                .blocklist
                .map(normalize_terms)
                .unwrap_or(defaults.blocklist),
            allowlist: file
                .allowlist
                .map(normalize_terms)
                .unwrap_or(defaults.allowlist),
        };

        if filter.allowlist.is_empty() {
            return Err(load_err(
                "allowlist is empty; every search hit would be rejected".to_string(),
            ));
        }
        Ok(filter)
    }

    pub fn blocklist(&self) -> &[String] {
        &self.blocklist
    }

    pub fn allowlist(&self) -> &[String] {
        &self.allowlist
    }

    /// Screens one hit. The blocklist is checked first and wins over any allowlist term.
    pub fn evaluate(&self, result: &ImageResult) -> FilterDecision {
        let text = result.combined_text();

        if let Some(term) = self.blocklist.iter().find(|t| text.contains(t.as_str())) {
            return FilterDecision::Blocked { term: term.clone() };
        }

        match self.allowlist.iter().find(|t| text.contains(t.as_str())) {
            Some(term) => FilterDecision::Accepted { term: term.clone() },
            None => FilterDecision::NoAllowlistMatch,
        }
    }
}

fn normalize_terms<I>(terms: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    terms
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}
