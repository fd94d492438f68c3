use std::time::Duration;
use thiserror::Error;

/// Why a proposed file name was rejected. Always recoverable: the session
/// stays pending and the user is asked again.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name is empty")]
    Empty,

    #[error("name is longer than {max} characters")]
    TooLong { max: usize },

    #[error("name has no valid characters")]
    NoValidCharacters,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Telegram API error in {method}: {description}")]
    Api {
        method: &'static str,
        description: String,
    },

    #[error("malformed Telegram response: {0}")]
    Malformed(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }

    /// Classify a reqwest failure, reporting `limit` when it was a timeout.
    pub fn from_reqwest(e: reqwest::Error, limit: Duration) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(limit)
        } else {
            TransportError::Request(e)
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Malformed(e.to_string())
    }
}

/// Failure of a single rename flow step, mapped to a user-facing reply by
/// the controller boundary.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("invalid name: {0}")]
    Validation(#[from] ValidationError),

    #[error("no pending upload for user")]
    SessionExpired,

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
}

impl FlowError {
    /// Whether the pending session should survive this error.
    pub fn keeps_session(&self) -> bool {
        matches!(self, FlowError::Validation(_))
    }
}
