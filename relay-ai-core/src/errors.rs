//! Error types for relay-ai.
//!
//! Dispatch failures never start a stream. They are classified into an
//! [`ErrorEnvelope`] that the boundary serializes as a response body.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The main error type for relay-ai operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Dispatch failed before a stream was started.
    #[error(transparent)]
    Dispatch(#[from] ErrorEnvelope),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Stable taxonomy of boundary errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// The provider answered with a structured error body.
    #[serde(rename = "OpenAIBizError")]
    OpenAIBizError,
    /// Transport failure, malformed response, or anything else.
    #[serde(rename = "InternalServerError")]
    InternalServerError,
    /// The caller's credentials were rejected before dispatch.
    #[serde(rename = "InvalidAccessCode")]
    InvalidAccessCode,
    /// No provider API key is configured.
    #[serde(rename = "NoAPIKey")]
    NoApiKey,
}

impl ErrorType {
    /// Wire name of the error type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAIBizError => "OpenAIBizError",
            Self::InternalServerError => "InternalServerError",
            Self::InvalidAccessCode => "InvalidAccessCode",
            Self::NoApiKey => "NoAPIKey",
        }
    }

    /// Default HTTP status for this error type.
    #[must_use]
    pub fn default_status(&self) -> u16 {
        match self {
            Self::OpenAIBizError | Self::InternalServerError => 500,
            Self::InvalidAccessCode | Self::NoApiKey => 401,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Identity of the upstream endpoint, for diagnostics.
    pub endpoint: String,
    /// Structured provider error, or an opaque message.
    pub error: Value,
}

/// A classified dispatch failure.
///
/// Serializes as `{"errorType": "...", "body": {"endpoint": "...", "error": ...}}`.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Error classification.
    pub error_type: ErrorType,
    /// Diagnostic body.
    pub body: ErrorBody,
    /// HTTP status to answer with.
    #[serde(skip)]
    pub status: Option<u16>,
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}", self.error_type, self.body.endpoint)?;
        match &self.body.error {
            Value::String(message) => write!(f, ": {}", message),
            Value::Null => Ok(()),
            other => write!(f, ": {}", other),
        }
    }
}

impl ErrorEnvelope {
    /// Create a new envelope.
    pub fn new(error_type: ErrorType, endpoint: impl Into<String>, error: Value) -> Self {
        Self {
            error_type,
            body: ErrorBody {
                endpoint: endpoint.into(),
                error,
            },
            status: None,
        }
    }

    /// Provider returned a structured error body.
    pub fn business(endpoint: impl Into<String>, error: Value) -> Self {
        Self::new(ErrorType::OpenAIBizError, endpoint, error)
    }

    /// Transport or other internal failure.
    pub fn internal(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorType::InternalServerError,
            endpoint,
            Value::String(message.into()),
        )
    }

    /// Set the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// HTTP status to answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status
            .unwrap_or_else(|| self.error_type.default_status())
    }

    /// Serialize as a JSON response body.
    pub fn to_body(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = ErrorEnvelope::business(
            "https://api.openai.com/v1",
            json!({"message": "quota exceeded", "code": "insufficient_quota"}),
        )
        .with_status(429);

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "errorType": "OpenAIBizError",
                "body": {
                    "endpoint": "https://api.openai.com/v1",
                    "error": {"message": "quota exceeded", "code": "insufficient_quota"}
                }
            })
        );
        assert_eq!(envelope.status_code(), 429);
    }

    #[rstest]
    #[case(ErrorType::OpenAIBizError, 500)]
    #[case(ErrorType::InternalServerError, 500)]
    #[case(ErrorType::InvalidAccessCode, 401)]
    #[case(ErrorType::NoApiKey, 401)]
    fn test_default_status(#[case] error_type: ErrorType, #[case] status: u16) {
        let envelope = ErrorEnvelope::new(error_type, "endpoint", Value::Null);
        assert_eq!(envelope.status_code(), status);
    }

    #[test]
    fn test_error_display() {
        let err = ErrorEnvelope::internal("https://example.com", "connection refused");
        assert_eq!(
            err.to_string(),
            "InternalServerError from https://example.com: connection refused"
        );
    }

    #[test]
    fn test_no_api_key_wire_name() {
        assert_eq!(serde_json::to_value(ErrorType::NoApiKey).unwrap(), json!("NoAPIKey"));
    }

    #[test]
    fn test_relay_error_from_envelope() {
        let err: RelayError = ErrorEnvelope::internal("e", "boom").into();
        assert!(matches!(err, RelayError::Dispatch(_)));
    }
}
