use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub type BadgeId = Uuid;

/// A catalog badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeRecord {
    pub id: BadgeId,
    pub name: String,
    #[serde(default)]
    pub year: Option<i32>,
    /// Maker or team credited for the badge.
    #[serde(default)]
    pub maker: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_link: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BadgeRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            year: None,
            maker: None,
            category: None,
            description: None,
            external_link: None,
            image_url: None,
            created_at: Some(Utc::now()),
            updated_at: None,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_maker(mut self, maker: impl Into<String>) -> Self {
        self.maker = Some(maker.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_external_link(mut self, link: impl Into<String>) -> Self {
        self.external_link = Some(link.into());
        self
    }

    /// Short label used by keyword matching: name, maker and year.
    pub fn search_label(&self) -> String {
        let mut label = self.name.clone();
        if let Some(maker) = self.maker.as_deref().filter(|m| !m.trim().is_empty()) {
            label.push(' ');
            label.push_str(maker);
        }
        if let Some(year) = self.year {
            label.push(' ');
            label.push_str(&year.to_string());
        }
        label
    }
}

/// Canonical descriptive text of a badge.
///
/// Embeddings are generated from this text, and a change in it is what makes an embedding stale.
pub fn descriptor_text(badge: &BadgeRecord) -> String {
    let mut parts: Vec<String> = vec![badge.name.trim().to_string()];
    if let Some(year) = badge.year {
        parts.push(year.to_string());
    }
    for field in [&badge.maker, &badge.category, &badge.description] {
        if let Some(value) = field.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            parts.push(value.to_string());
        }
    }
    parts.retain(|p| !p.is_empty());
    parts.join(" | ")
}

/// Embedding vector for one badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeEmbedding {
    pub badge_id: BadgeId,
    #[serde(deserialize_with = "deserialize_vector")]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BadgeEmbedding {
    pub fn new(badge_id: BadgeId, embedding: Vec<f32>) -> Self {
        Self {
            badge_id,
            embedding,
            model: None,
            updated_at: Some(Utc::now()),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

/// Accepts a JSON array of numbers or the textual vector form `"[0.1,0.2]"` that
/// pgvector columns come back as through PostgREST.
fn deserialize_vector<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawVector {
        Numbers(Vec<f32>),
        Text(String),
    }

    match RawVector::deserialize(deserializer)? {
        RawVector::Numbers(values) => Ok(values),
        RawVector::Text(text) => parse_vector_text(&text).map_err(serde::de::Error::custom),
    }
}

pub(crate) fn parse_vector_text(text: &str) -> Result<Vec<f32>, String> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| format!("vector text must be bracketed, got {:?}", truncate(text, 32)))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid vector component {:?}: {e}", v.trim()))
        })
        .collect()
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
