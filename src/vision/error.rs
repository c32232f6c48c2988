use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("vision API returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("failed to build vision request: {reason}")]
    InvalidRequest { reason: String },

    #[error("vision response had no text content")]
    EmptyResponse,

    #[error("no JSON object found in vision response")]
    NoJsonObject,

    #[error("invalid JSON in vision response: {reason}")]
    InvalidJson { reason: String },

    #[error("invalid vision configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<reqwest::Error> for VisionError {
    fn from(err: reqwest::Error) -> Self {
        VisionError::RequestFailed {
            reason: err.to_string(),
        }
    }
}
