//! Image intake: decoding the `imageBase64` request field.

pub mod error;


pub use error::ImageError;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::hashing::hash_bytes;

pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";
pub const MIME_GIF: &str = "image/gif";
pub const MIME_WEBP: &str = "image/webp";
pub const MIME_UNKNOWN: &str = "application/octet-stream";

/// A decoded badge photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeImage {
    bytes: Vec<u8>,
    mime_type: String,
    hash: [u8; 32],
}

impl BadgeImage {
    /// Wraps raw bytes, sniffing the MIME type from magic bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let mime_type = sniff_mime_type(&bytes).to_string();
        let hash = hash_bytes(&bytes);
        Ok(Self {
            bytes,
            mime_type,
            hash,
        })
    }

    /// Decodes raw base64 or a `data:<mime>;base64,<payload>` URL.
    ///
    /// A MIME type declared by the data URL wins over sniffing. Common aliases such as
    /// `image/jpg` are normalized.
    pub fn decode(input: &str, max_bytes: usize) -> Result<Self, ImageError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ImageError::Empty);
        }

        let (declared_mime, payload) = split_data_url(input)?;

        // 4 base64 chars encode 3 bytes; line breaks carry none
        let encoded_len = payload.bytes().filter(|b| !b.is_ascii_whitespace()).count();
        let estimated = encoded_len / 4 * 3;
        if estimated > max_bytes.saturating_add(3) {
            return Err(ImageError::TooLarge {
                size: estimated,
                max: max_bytes,
            });
        }

        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|e| ImageError::InvalidBase64 {
                reason: e.to_string(),
            })?;

        if bytes.len() > max_bytes {
            return Err(ImageError::TooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }

        let mut image = Self::from_bytes(bytes)?;
        if let Some(mime) = declared_mime {
            image.mime_type = mime;
        }
        Ok(image)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// BLAKE3 hash of the decoded bytes.
    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Returns a `data:` URL suitable for inline image references in model requests.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension matching the MIME type (used for uploaded object names).
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            MIME_JPEG => "jpg",
            MIME_PNG => "png",
            MIME_GIF => "gif",
            MIME_WEBP => "webp",
            _ => "bin",
        }
    }
}

fn split_data_url(input: &str) -> Result<(Option<String>, &str), ImageError> {
    let Some(rest) = input.strip_prefix("data:") else {
        return Ok((None, input));
    };

    let (header, payload) = rest
        .split_once(',')
        .ok_or(ImageError::MalformedDataUrl)?;

    let mut parts = header.split(';');
    let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(ImageError::MalformedDataUrl);
    }

    let mime = if mime.is_empty() {
        None
    } else {
        Some(normalize_mime(mime))
    };
    Ok((mime, payload))
}

fn normalize_mime(mime: String) -> String {
    match mime.as_str() {
        "image/jpg" | "image/pjpeg" => MIME_JPEG.to_string(),
        "image/x-png" => MIME_PNG.to_string(),
        _ => mime,
    }
}

/// Sniffs a MIME type from magic bytes.
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        MIME_JPEG
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        MIME_PNG
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        MIME_GIF
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        MIME_WEBP
    } else {
        MIME_UNKNOWN
    }
}
