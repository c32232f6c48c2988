//! Small readers for `BADGELIFE_*` variables shared by every sub-config.
//!
//! Unset and blank values are treated the same.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Trimmed value of `name`, or `None` when unset or blank.
pub fn optional_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn optional_path(name: &str) -> Option<PathBuf> {
    optional_string(name).map(PathBuf::from)
}

pub fn string_or(name: &str, default: String) -> String {
    optional_string(name).unwrap_or(default)
}

/// Parsed value of `name`. Unparsable values are ignored.
pub fn optional_parse<T: FromStr>(name: &str) -> Option<T> {
    optional_string(name).and_then(|v| v.parse().ok())
}

pub fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    optional_parse(name).unwrap_or(default)
}
