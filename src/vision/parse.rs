use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::VisionError;
use crate::constants::{
    VISION_DEFAULT_CONFIDENCE, VISION_PLACEHOLDER_CONFIDENCE, VISION_PLACEHOLDER_NAME,
    clamp_confidence,
};

/// What the vision model said about a badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionAnalysis {
    pub name: String,
    pub description: Option<String>,
    pub maker: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub confidence: u8,
    /// Set when the model answer was unusable and this is the fixed fallback.
    pub placeholder: bool,
}

impl VisionAnalysis {
    pub fn placeholder() -> Self {
        Self {
            name: VISION_PLACEHOLDER_NAME.to_string(),
            description: Some(
                "An electronic badge that could not be identified automatically.".to_string(),
            ),
            maker: None,
            category: Some("Electronic Badge".to_string()),
            year: None,
            confidence: VISION_PLACEHOLDER_CONFIDENCE,
            placeholder: true,
        }
    }
}

/// Returns the first balanced `{...}` block of `text`.
///
/// Braces inside JSON strings are ignored. Returns `None` if no block closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses a model reply into a [`VisionAnalysis`].
///
/// Field types are taken leniently: numbers may arrive as strings, and a fractional confidence
/// in `(0, 1]` is read as a probability and scaled to `0..=100`.
pub fn parse_analysis(text: &str) -> Result<VisionAnalysis, VisionError> {
    let block = extract_json_object(text).ok_or(VisionError::NoJsonObject)?;
    let value: Value = serde_json::from_str(block).map_err(|e| VisionError::InvalidJson {
        reason: e.to_string(),
    })?;

    let name = text_field(&value, "name").ok_or_else(|| VisionError::InvalidJson {
        reason: "missing \"name\"".to_string(),
    })?;

    Ok(VisionAnalysis {
        name,
        description: text_field(&value, "description"),
        maker: text_field(&value, "maker"),
        category: text_field(&value, "category"),
        year: value.get("year").and_then(year_value),
        confidence: value
            .get("confidence")
            .and_then(confidence_value)
            .unwrap_or(VISION_DEFAULT_CONFIDENCE),
        placeholder: false,
    })
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
        .map(str::to_string)
}

fn year_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn confidence_value(value: &Value) -> Option<u8> {
    let (raw, fractional) = match value {
        Value::Number(n) => (n.as_f64()?, n.is_f64()),
        Value::String(s) => {
            let s = s.trim().trim_end_matches('%').trim();
            (s.parse::<f64>().ok()?, s.contains('.'))
        }
        _ => return None,
    };

    let scaled = if fractional && raw > 0.0 && raw <= 1.0 {
        raw * 100.0
    } else {
        raw
    };
    Some(clamp_confidence(scaled as f32))
}
