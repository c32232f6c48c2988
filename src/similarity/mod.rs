//! Similarity math used by the cascade.
//!
//! - [`cosine_similarity`] compares embedding vectors (stage 1).
//! - [`text_similarity`] is a Jaccard score over word sets, used as the last-resort
//!   keyword search over the catalog.


use std::collections::HashSet;

use crate::constants::MIN_WORD_LEN;

/// Cosine similarity `dot(a, b) / (|a| |b|)`, clamped to `[-1, 1]`.
///
/// Mismatched lengths, empty inputs, zero-norm vectors and non-finite results all return `0.0`.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (&av, &bv)| {
            (dot + av * bv, na + av * av, nb + bv * bv)
        });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Scales `vector` to unit length.
///
/// Returns `None` for empty, zero-norm or non-finite vectors.
pub fn normalize_vector(vector: &[f32]) -> Option<Vec<f32>> {
    if vector.is_empty() || vector.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }

    Some(vector.iter().map(|v| v / norm).collect())
}

/// Lower-cases `text`, strips punctuation and returns the set of words longer than two chars.
pub fn tokenize_words(text: &str) -> HashSet<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();

    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|` over the word sets of `a` and `b`.
///
/// Returns `0.0` when either input is empty. Two inputs that are equal after trimming and
/// lower-casing always score `1.0`, even if every word is shorter than the length filter.
pub fn text_similarity(a: &str, b: &str) -> f32 {
    let a_trimmed = a.trim();
    let b_trimmed = b.trim();
    if a_trimmed.is_empty() || b_trimmed.is_empty() {
        return 0.0;
    }

    if a_trimmed.to_lowercase() == b_trimmed.to_lowercase() {
        return 1.0;
    }

    let words_a = tokenize_words(a_trimmed);
    let words_b = tokenize_words(b_trimmed);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}
