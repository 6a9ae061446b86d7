//! Streaming errors.

use thiserror::Error;

/// Errors that end an output stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// An event matched neither the chat nor the legacy chunk shape.
    #[error("Unclassifiable chunk: {0}")]
    Classification(String),

    /// Parse error for SSE event.
    #[error("Failed to parse SSE event: {0}")]
    ParseSse(String),

    /// SSE buffer grew past its limit without an event boundary.
    #[error("SSE buffer overflow")]
    BufferOverflow,

    /// JSON parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The function-call handler failed.
    #[error("Function call handler failed: {0}")]
    Handler(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl StreamError {
    /// Create from any error.
    pub fn from_err<E: std::fmt::Display>(err: E) -> Self {
        Self::Other(err.to_string())
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;
