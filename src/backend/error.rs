//! Backend error types
//!
//! Errors from remote calls and channel subscriptions. Nothing in this crate
//! retries a failed backend call; every error propagates to the caller
//! unchanged.

/// Error type for backend transport operations
#[derive(Debug)]
pub enum BackendError {
    /// The remote operation rejected the call
    Rejected { operation: String, message: String },
    /// The remote operation did not reply in time
    Timeout { operation: String },
    /// The reply arrived but did not decode into the expected shape
    Decode {
        operation: String,
        source: serde_json::Error,
    },
    /// The push channel refused the subscription or is gone
    ChannelClosed { channel: String },
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Rejected { operation, message } => {
                write!(f, "Backend rejected {}: {}", operation, message)
            }
            BackendError::Timeout { operation } => {
                write!(f, "Backend call timed out: {}", operation)
            }
            BackendError::Decode { operation, source } => {
                write!(f, "Malformed reply from {}: {}", operation, source)
            }
            BackendError::ChannelClosed { channel } => {
                write!(f, "Push channel closed: {}", channel)
            }
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}
