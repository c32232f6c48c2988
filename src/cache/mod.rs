//! Identification result cache and the status header values reported with it.

pub mod config;
pub mod result;
pub mod types;


pub use config::CacheConfig;
pub use result::ResultCache;
pub use types::{
    BADGELIFE_STATUS_ERROR, BADGELIFE_STATUS_HEADER, BADGELIFE_STATUS_HEALTHY,
    BADGELIFE_STATUS_NOT_READY, BADGELIFE_STATUS_READY, CacheStatus,
};
