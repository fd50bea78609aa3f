//! Error types for backend calls.

use thiserror::Error;

use crate::model::ShelfError;

/// Errors that can occur while talking to the backend.
///
/// Errors travel back to the controller inside messages, so they carry
/// rendered strings rather than source errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection, DNS or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-success status
    #[error("Server returned {code}: {body}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Local I/O failure, e.g. reading the selected image
    #[error("IO error: {0}")]
    Io(String),
}

impl ApiError {
    /// Create a malformed-response error with a message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Short category name for logs and notices.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "transport",
            ApiError::Timeout => "timeout",
            ApiError::Status { .. } => "status",
            ApiError::Malformed(_) => "malformed",
            ApiError::Io(_) => "io",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::Status {
                code: status.as_u16(),
                body: String::new(),
            }
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Malformed(e.to_string())
    }
}

impl From<ShelfError> for ApiError {
    fn from(e: ShelfError) -> Self {
        ApiError::Malformed(e.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Io(e.to_string())
    }
}
