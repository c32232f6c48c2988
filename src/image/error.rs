use thiserror::Error;

/// Errors raised while decoding an uploaded image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image payload is empty")]
    Empty,

    #[error("image payload is not valid base64: {reason}")]
    InvalidBase64 { reason: String },

    #[error("malformed data URL: expected `data:<mime>;base64,<payload>`")]
    MalformedDataUrl,

    #[error("image is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },
}
