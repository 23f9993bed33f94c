//! Error types for slot-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlotError {
    /// A required request field was absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The request was present but its values cannot be searched.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A single provider record could not be turned into an interval.
    /// Raised per event; callers building a busy set skip the record.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The interval source failed (network, expired credential, rate limit).
    #[error("Upstream fetch failed: {0}")]
    Upstream(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SlotError {
    /// True for errors caused by the caller's input rather than by the
    /// engine or its interval source.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SlotError::MissingField(_)
                | SlotError::InvalidRequest(_)
                | SlotError::InvalidTimestamp(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SlotError>;
