//! Error types for the MCP server

use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during MCP server operations
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown tool requested
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Missing or ill-typed tool arguments
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Error reported by the provider or the client talking to it
    #[error(transparent)]
    Compute(#[from] gce_compute::Error),

    /// Error during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid startup configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Server not initialized
    #[error("server not initialized")]
    NotInitialized,
}

impl Error {
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Error::InvalidArguments {
            message: message.into(),
        }
    }

    /// True for errors in the call itself, detected before reaching the provider.
    ///
    /// These become JSON-RPC errors; everything else is reported as a tool
    /// result with `isError` set.
    pub fn is_invocation_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownTool(_)
                | Error::InvalidArguments { .. }
                | Error::Compute(gce_compute::Error::InvalidPath(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_errors() {
        assert!(Error::UnknownTool("launch_rocket".into()).is_invocation_error());
        assert!(Error::invalid_arguments("missing required argument: name").is_invocation_error());
        assert!(
            Error::from(gce_compute::Error::InvalidPath("\"..\" is not a usable resource name".into()))
                .is_invocation_error()
        );
    }

    #[test]
    fn provider_errors_are_not_invocation_errors() {
        let err = Error::from(gce_compute::Error::Provider {
            status: 403,
            reason: "PERMISSION_DENIED".into(),
            message: "Required 'compute.instances.delete' permission".into(),
        });
        assert!(!err.is_invocation_error());
        assert_eq!(
            err.to_string(),
            "provider error (403 PERMISSION_DENIED): Required 'compute.instances.delete' permission"
        );
    }
}
