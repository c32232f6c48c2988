//! Cross-cutting, shared constants for the identification cascade.
//!
//! Confidence values are integers in `0..=100`. Similarity values are raw `f32` scores
//! (cosine in `[-1, 1]`, Jaccard in `[0, 1]`).

/// Embedding candidates scoring below this cosine similarity are discarded.
pub const DEFAULT_SIMILARITY_FLOOR: f32 = 0.3;

/// Cosine similarity at or above which a match counts as near-exact.
pub const NEAR_EXACT_SIMILARITY: f32 = 0.95;

/// Confidence added to near-exact matches (result capped at [`MAX_CONFIDENCE`]).
pub const NEAR_EXACT_BOOST: u8 = 5;

/// Maximum number of database matches returned per identification.
pub const DEFAULT_TOP_K: usize = 5;

/// Fixed confidence assigned to an accepted reverse-image search result.
pub const WEB_SEARCH_CONFIDENCE: u8 = 65;

/// Confidence of the vision placeholder used when the model answer is unusable.
pub const VISION_PLACEHOLDER_CONFIDENCE: u8 = 25;

/// Confidence used when the vision model names a badge but omits its own confidence.
pub const VISION_DEFAULT_CONFIDENCE: u8 = 50;

/// Confidence reported when no stage produced anything.
pub const UNKNOWN_BADGE_CONFIDENCE: u8 = 0;

/// Confidence at or below which the UI treats an identification as unreliable.
pub const UNRELIABLE_CONFIDENCE: u8 = 30;

pub const MAX_CONFIDENCE: u8 = 100;

/// Jaccard floor for the text-similarity fallback over the catalog.
pub const DEFAULT_TEXT_MATCH_FLOOR: f32 = 0.3;

/// Words shorter than this (in chars) are ignored by the text similarity.
pub const MIN_WORD_LEN: usize = 3;

pub const UNKNOWN_BADGE_NAME: &str = "Unknown Badge";
pub const VISION_PLACEHOLDER_NAME: &str = "Unknown Electronic Badge";

/// Default cap on decoded image size (10 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Converts a similarity score into a `0..=100` confidence.
///
/// Negative similarities map to `0`. Scores at or above [`NEAR_EXACT_SIMILARITY`] get
/// [`NEAR_EXACT_BOOST`] on top, capped at [`MAX_CONFIDENCE`].
///
/// ```
/// use badgelife::constants::match_confidence;
///
/// assert_eq!(match_confidence(0.97), 100);
/// assert_eq!(match_confidence(0.80), 80);
/// ```
pub fn match_confidence(similarity: f32) -> u8 {
    let base = clamp_confidence(similarity * 100.0);
    if similarity >= NEAR_EXACT_SIMILARITY {
        base.saturating_add(NEAR_EXACT_BOOST).min(MAX_CONFIDENCE)
    } else {
        base
    }
}

/// Rounds and clamps a raw score into `0..=100`. `NaN` maps to `0`.
pub fn clamp_confidence(raw: f32) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, MAX_CONFIDENCE as f32) as u8
}
