//! Error types for the Compute Engine client

use std::path::PathBuf;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to Google Cloud
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The API answered with a non-success status.
    ///
    /// `message` is the provider's own message, untouched.
    #[error("provider error ({status} {reason}): {message}")]
    Provider {
        status: u16,
        reason: String,
        message: String,
    },

    /// A long-running operation finished with errors
    #[error("operation {operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    /// Service account key could not be loaded
    #[error("invalid credentials at {path}: {message}")]
    Credentials { path: PathBuf, message: String },

    /// A request URL could not be built from the base and the resource names
    #[error("invalid request path: {0}")]
    InvalidPath(String),

    /// Token exchange failed
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Signing the token assertion failed
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected response body
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the provider reported that the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Provider { status: 404, .. })
    }
}
