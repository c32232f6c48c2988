use std::time::Duration;

use crate::config::env;

pub const DEFAULT_SEARCH_URL: &str = "https://serpapi.com/search.json";
pub const DEFAULT_SEARCH_ENGINE: &str = "google_reverse_image";
pub const DEFAULT_STORAGE_BUCKET: &str = "badge-search-temp";
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Reverse-image search provider settings.
#[derive(Debug, Clone)]
pub struct ReverseSearchConfig {
    /// `None` leaves the web search stage unconfigured.
    pub api_key: Option<String>,
    pub url: String,
    pub engine: String,
    pub timeout: Duration,
}

impl Default for ReverseSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            url: DEFAULT_SEARCH_URL.to_string(),
            engine: DEFAULT_SEARCH_ENGINE.to_string(),
            timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }
}

impl ReverseSearchConfig {
    pub const ENV_API_KEY: &'static str = "BADGELIFE_SEARCH_API_KEY";
    pub const ENV_URL: &'static str = "BADGELIFE_SEARCH_URL";

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::optional_string(Self::ENV_API_KEY),
            url: env::string_or(Self::ENV_URL, defaults.url),
            ..defaults
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Object storage used to give the search provider a public URL.
#[derive(Debug, Clone)]
pub struct ImageHostConfig {
    /// Storage base URL (without `/storage/v1`).
    pub url: Option<String>,
    pub api_key: Option<String>,
    /// Must be a public bucket.
    pub bucket: String,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            bucket: DEFAULT_STORAGE_BUCKET.to_string(),
        }
    }
}

impl ImageHostConfig {
    pub const ENV_URL: &'static str = "BADGELIFE_STORAGE_URL";
    pub const ENV_KEY: &'static str = "BADGELIFE_STORAGE_KEY";
    pub const ENV_BUCKET: &'static str = "BADGELIFE_STORAGE_BUCKET";

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env::optional_string(Self::ENV_URL),
            api_key: env::optional_string(Self::ENV_KEY),
            bucket: env::string_or(Self::ENV_BUCKET, defaults.bucket),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.api_key.is_some()
    }
}
