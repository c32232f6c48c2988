//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `BADGELIFE_*` environment variables. Missing API
//! keys are not errors: the stage that needs them reports itself as unconfigured.

pub mod env;
pub mod error;


pub use error::ConfigError;

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use crate::cache::CacheConfig;
use crate::catalog::CatalogConfig;
use crate::constants::{DEFAULT_MAX_IMAGE_BYTES, DEFAULT_TEXT_MATCH_FLOOR};
use crate::embedding::{EmbeddingApiConfig, MatcherConfig};
use crate::search::{ImageHostConfig, ReverseSearchConfig};
use crate::vision::VisionConfig;

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `BADGELIFE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Largest accepted decoded image. Default: 10 MiB.
    pub max_image_bytes: usize,

    pub embedding: EmbeddingApiConfig,
    pub search: ReverseSearchConfig,
    pub storage: ImageHostConfig,
    pub vision: VisionConfig,
    pub catalog: CatalogConfig,
    pub matcher: MatcherConfig,
    pub cache: CacheConfig,

    /// Jaccard floor for keyword matching over the catalog. Default: `0.3`.
    pub text_match_floor: f32,

    /// JSON file with keyword filter term lists. Built-in lists are used when unset.
    pub keyword_filter_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            embedding: EmbeddingApiConfig::default(),
            search: ReverseSearchConfig::default(),
            storage: ImageHostConfig::default(),
            vision: VisionConfig::default(),
            catalog: CatalogConfig::default(),
            matcher: MatcherConfig::default(),
            cache: CacheConfig::default(),
            text_match_floor: DEFAULT_TEXT_MATCH_FLOOR,
            keyword_filter_path: None,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "BADGELIFE_PORT";
    const ENV_BIND_ADDR: &'static str = "BADGELIFE_BIND_ADDR";
    const ENV_MAX_IMAGE_BYTES: &'static str = "BADGELIFE_MAX_IMAGE_BYTES";
    const ENV_TEXT_MATCH_FLOOR: &'static str = "BADGELIFE_TEXT_MATCH_FLOOR";
    const ENV_KEYWORD_FILTER_PATH: &'static str = "BADGELIFE_KEYWORD_FILTER_PATH";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;

        Ok(Self {
            port,
            bind_addr,
            max_image_bytes: env::parse_or(Self::ENV_MAX_IMAGE_BYTES, defaults.max_image_bytes),
            embedding: EmbeddingApiConfig::from_env(),
            search: ReverseSearchConfig::from_env(),
            storage: ImageHostConfig::from_env(),
            vision: VisionConfig::from_env(),
            catalog: CatalogConfig::from_env(),
            matcher: MatcherConfig::from_env(),
            cache: CacheConfig::from_env(),
            text_match_floor: env::parse_or(Self::ENV_TEXT_MATCH_FLOOR, defaults.text_match_floor),
            keyword_filter_path: env::optional_path(Self::ENV_KEYWORD_FILTER_PATH),
        })
    }

    /// Validates paths, ranges and URLs (does not contact any service).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.keyword_filter_path {
            Self::require_file(path)?;
        }
        if let Some(ref path) = self.catalog.seed_path {
            Self::require_file(path)?;
        }

        if self.max_image_bytes == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_MAX_IMAGE_BYTES,
                value: self.max_image_bytes.to_string(),
                expected: "greater than 0",
            });
        }
        if !(-1.0..=1.0).contains(&self.matcher.similarity_floor) {
            return Err(ConfigError::OutOfRange {
                name: MatcherConfig::ENV_SIMILARITY_FLOOR,
                value: self.matcher.similarity_floor.to_string(),
                expected: "between -1.0 and 1.0",
            });
        }
        if self.matcher.top_k == 0 {
            return Err(ConfigError::OutOfRange {
                name: MatcherConfig::ENV_TOP_K,
                value: "0".to_string(),
                expected: "at least 1",
            });
        }
        if !(0.0..=1.0).contains(&self.text_match_floor) {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_TEXT_MATCH_FLOOR,
                value: self.text_match_floor.to_string(),
                expected: "between 0.0 and 1.0",
            });
        }

        Self::require_url(EmbeddingApiConfig::ENV_URL, &self.embedding.base_url)?;
        Self::require_url(ReverseSearchConfig::ENV_URL, &self.search.url)?;
        Self::require_url(VisionConfig::ENV_URL, &self.vision.base_url)?;
        if let Some(ref url) = self.storage.url {
            Self::require_url(ImageHostConfig::ENV_URL, url)?;
        }
        if let Some(ref url) = self.catalog.url {
            Self::require_url(CatalogConfig::ENV_URL, url)?;
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::optional_string(Self::ENV_PORT) {
            Some(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            None => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::optional_string(Self::ENV_BIND_ADDR) {
            Some(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            None => Ok(default),
        }
    }

    fn require_file(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(ConfigError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn require_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                name,
                value: value.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(())
    }
}
