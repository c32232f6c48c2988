pub const BADGELIFE_STATUS_HEADER: &str = "X-Badgelife-Status";
pub const BADGELIFE_STATUS_HEALTHY: &str = "healthy";
pub const BADGELIFE_STATUS_READY: &str = "ready";
pub const BADGELIFE_STATUS_NOT_READY: &str = "not_ready";
pub const BADGELIFE_STATUS_ERROR: &str = "error";

/// Whether an identification was served from the result cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    #[inline]
    pub fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheStatus::Hit)
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_header_value())
    }
}
