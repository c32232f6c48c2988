use serde::{Deserialize, Serialize};

use crate::constants::WEB_SEARCH_CONFIDENCE;

/// One entry of a reverse-image search response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl ImageResult {
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            link: link.into(),
            thumbnail: None,
        }
    }

    /// Lowercased `title snippet link`, the text the keyword filter looks at.
    pub fn combined_text(&self) -> String {
        format!("{} {} {}", self.title, self.snippet, self.link).to_lowercase()
    }
}

/// An accepted web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub thumbnail: Option<String>,
    pub confidence: u8,
}

impl From<ImageResult> for WebSearchHit {
    fn from(result: ImageResult) -> Self {
        Self {
            title: result.title,
            snippet: result.snippet,
            link: result.link,
            thumbnail: result.thumbnail,
            confidence: WEB_SEARCH_CONFIDENCE,
        }
    }
}
