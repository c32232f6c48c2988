use serde::{Deserialize, Serialize};

use crate::catalog::BadgeRecord;
use crate::constants::{UNKNOWN_BADGE_CONFIDENCE, UNKNOWN_BADGE_NAME, UNRELIABLE_CONFIDENCE};

/// Which stage produced the primary answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Database,
    WebSearch,
    AiAnalysis,
    None,
}

impl AnalysisSource {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisSource::Database => "database",
            AnalysisSource::WebSearch => "web_search",
            AnalysisSource::AiAnalysis => "ai_analysis",
            AnalysisSource::None => "none",
        }
    }

    /// Human-readable attribution shown next to the answer.
    #[inline]
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisSource::Database => "Database Match",
            AnalysisSource::WebSearch => "Google Search",
            AnalysisSource::AiAnalysis => "AI Analysis",
            AnalysisSource::None => "None",
        }
    }
}

impl std::fmt::Display for AnalysisSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The normalized answer of one identification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub maker: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Always in `0..=100`.
    pub confidence: u8,
    pub source: AnalysisSource,
    pub source_label: String,
    /// Badge records of the returned matches (no embedding vectors).
    #[serde(default)]
    pub database_matches: Vec<BadgeRecord>,
}

impl AnalysisResult {
    pub fn new(name: impl Into<String>, confidence: u8, source: AnalysisSource) -> Self {
        Self {
            name: name.into(),
            description: None,
            year: None,
            maker: None,
            category: None,
            link: None,
            thumbnail: None,
            confidence: confidence.min(100),
            source,
            source_label: source.label().to_string(),
            database_matches: Vec::new(),
        }
    }

    /// The answer reported when nothing identified the badge.
    pub fn unknown() -> Self {
        let mut result = Self::new(UNKNOWN_BADGE_NAME, UNKNOWN_BADGE_CONFIDENCE, AnalysisSource::None);
        result.description = Some("No stage could identify this badge.".to_string());
        result
    }

    pub fn from_badge(badge: &BadgeRecord, confidence: u8) -> Self {
        let mut result = Self::new(badge.name.clone(), confidence, AnalysisSource::Database);
        result.description = badge.description.clone();
        result.year = badge.year;
        result.maker = badge.maker.clone();
        result.category = badge.category.clone();
        result.link = badge.external_link.clone();
        result.thumbnail = badge.image_url.clone();
        result
    }

    pub(crate) fn set_source(&mut self, source: AnalysisSource) {
        self.source = source;
        self.source_label = source.label().to_string();
    }

    pub fn is_unreliable(&self) -> bool {
        self.confidence <= UNRELIABLE_CONFIDENCE
    }
}

/// A catalog badge paired with how closely it matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseMatch {
    pub badge: BadgeRecord,
    pub similarity: f32,
    pub confidence: u8,
}

impl DatabaseMatch {
    pub fn new(badge: BadgeRecord, similarity: f32, confidence: u8) -> Self {
        Self {
            badge,
            similarity,
            confidence: confidence.min(100),
        }
    }
}

/// Response of one identification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    pub analysis: AnalysisResult,
    pub matches: Vec<DatabaseMatch>,
    /// Set when a stage that ran failed, so a retry may give a better answer.
    #[serde(skip)]
    pub degraded: bool,
}

impl Identification {
    /// Only complete answers are worth replaying from the result cache.
    pub fn is_cacheable(&self) -> bool {
        !self.degraded && self.analysis.source != AnalysisSource::None
    }
}

/// Sorts matches by descending similarity (ties keep their order).
pub fn sort_matches(matches: &mut [DatabaseMatch]) {
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
