use std::time::Duration;

use crate::config::env;

pub const DEFAULT_CACHE_CAPACITY: u64 = 1_000;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Sizing of the [`ResultCache`](super::ResultCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Max cached identifications. `0` disables the cache.
    pub capacity: u64,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl CacheConfig {
    pub const ENV_CAPACITY: &'static str = "BADGELIFE_CACHE_CAPACITY";
    pub const ENV_TTL_SECS: &'static str = "BADGELIFE_CACHE_TTL_SECS";

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env::parse_or(Self::ENV_CAPACITY, defaults.capacity),
            ttl: env::optional_parse::<u64>(Self::ENV_TTL_SECS)
                .map(Duration::from_secs)
                .unwrap_or(defaults.ttl),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0 && !self.ttl.is_zero()
    }
}
