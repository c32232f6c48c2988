use std::time::Duration;

use crate::config::env;

pub const DEFAULT_VISION_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_VISION_MAX_TOKENS: u32 = 500;
pub const DEFAULT_VISION_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat-completions vision endpoint settings.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// `None` leaves the vision stage unconfigured.
    pub api_key: Option<String>,
    /// Base URL; `/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_VISION_URL.to_string(),
            model: DEFAULT_VISION_MODEL.to_string(),
            max_tokens: DEFAULT_VISION_MAX_TOKENS,
            timeout: DEFAULT_VISION_TIMEOUT,
        }
    }
}

impl VisionConfig {
    pub const ENV_API_KEY: &'static str = "BADGELIFE_VISION_API_KEY";
    pub const ENV_URL: &'static str = "BADGELIFE_VISION_URL";
    pub const ENV_MODEL: &'static str = "BADGELIFE_VISION_MODEL";

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::optional_string(Self::ENV_API_KEY),
            base_url: env::string_or(Self::ENV_URL, defaults.base_url),
            model: env::string_or(Self::ENV_MODEL, defaults.model),
            ..defaults
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
