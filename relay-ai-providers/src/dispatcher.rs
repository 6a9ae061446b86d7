//! Dispatcher trait and error classification.
//!
//! A [`Dispatcher`] sends a [`ChatRequest`] upstream and hands back the
//! streaming response as an [`EventSource`]. Failures never start a
//! stream; they are classified into an [`ErrorEnvelope`] carrying the
//! endpoint identity.

use async_trait::async_trait;
use relay_ai_core::{ChatRequest, ErrorEnvelope, ErrorType};
use relay_ai_streaming::EventSource;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Sends chat requests upstream.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Identity of the upstream endpoint, used in error envelopes and logs.
    fn endpoint(&self) -> &str;

    /// Dispatch a request and return its event stream.
    async fn dispatch(&self, request: ChatRequest) -> Result<EventSource, ErrorEnvelope>;
}

/// Type alias for shared dispatchers.
pub type BoxedDispatcher = Arc<dyn Dispatcher>;

#[async_trait]
impl<D: Dispatcher + ?Sized> Dispatcher for Arc<D> {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    async fn dispatch(&self, request: ChatRequest) -> Result<EventSource, ErrorEnvelope> {
        (**self).dispatch(request).await
    }
}

/// Raw dispatch failure, before classification.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No API key configured.
    #[error("Missing API key")]
    MissingApiKey,

    /// The provider answered non-2xx.
    #[error("HTTP {status}: {body}")]
    Upstream {
        /// HTTP status.
        status: u16,
        /// Response body, as JSON if it parsed.
        body: Value,
    },

    /// Transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request could not be serialized.
    #[error("Failed to serialize request: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DispatchError {
    /// Classify into an envelope for `endpoint`.
    ///
    /// An upstream answer whose JSON body has an `error` member is a
    /// business error and keeps the upstream status. Everything else is
    /// internal.
    pub fn into_envelope(self, endpoint: &str) -> ErrorEnvelope {
        match self {
            Self::MissingApiKey => ErrorEnvelope::new(
                ErrorType::NoApiKey,
                endpoint,
                Value::String("no API key configured".into()),
            ),
            Self::Upstream { status, body } => match body.get("error") {
                Some(error) => ErrorEnvelope::business(endpoint, error.clone()).with_status(status),
                None => ErrorEnvelope::internal(endpoint, format!("HTTP {}: {}", status, body)),
            },
            other => ErrorEnvelope::internal(endpoint, other.to_string()),
        }
    }
}
