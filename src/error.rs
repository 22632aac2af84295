//! Error taxonomy for admin API calls.

use thiserror::Error;

/// Failure of a single admin API call or of the form checks that precede it.
///
/// `Display` is always the human-readable message an operator should see.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or transport failure before a response arrived.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected `{ data, message? }` envelope.
    #[error("Invalid response from server: {0}")]
    Decode(#[from] serde_json::Error),

    /// The envelope parsed but a required part was missing.
    #[error("Invalid response from server: {0}")]
    Malformed(String),

    /// Rejected locally, no request was sent.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status of the failed call, if the server answered at all.
    #[cfg(test)]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
