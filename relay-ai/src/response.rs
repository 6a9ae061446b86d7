//! Response shaping.

use crate::stream::OpenAIStream;
use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use relay_ai_core::{ChatRequest, ErrorEnvelope};
use relay_ai_providers::Dispatcher;
use relay_ai_streaming::StreamResult;
use std::fmt;
use tracing::error;

/// HTTP headers for an error envelope response.
pub const ERROR_HEADERS: &[(&str, &str)] = &[("content-type", "application/json")];

/// Encoded response body.
pub type ByteStream = BoxStream<'static, StreamResult<Bytes>>;

/// What a relay request answers with.
pub enum RelayResponse {
    /// A streaming body.
    Stream {
        /// Response headers.
        headers: &'static [(&'static str, &'static str)],
        /// Response body.
        body: ByteStream,
    },
    /// A serialized [`ErrorEnvelope`].
    Error {
        /// HTTP status.
        status: u16,
        /// JSON body.
        body: String,
    },
}

impl fmt::Debug for RelayResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream { headers, .. } => f
                .debug_struct("Stream")
                .field("headers", headers)
                .finish_non_exhaustive(),
            Self::Error { status, body } => f
                .debug_struct("Error")
                .field("status", status)
                .field("body", body)
                .finish(),
        }
    }
}

impl RelayResponse {
    /// A streaming response.
    pub fn stream<S>(headers: &'static [(&'static str, &'static str)], body: S) -> Self
    where
        S: Stream<Item = StreamResult<Bytes>> + Send + 'static,
    {
        Self::Stream {
            headers,
            body: body.boxed(),
        }
    }

    /// An error response for `envelope`.
    pub fn from_error(envelope: &ErrorEnvelope) -> Self {
        let body = envelope.to_body().unwrap_or_else(|err| {
            format!(
                r#"{{"errorType":"{}","body":{{"endpoint":"","error":"{}"}}}}"#,
                envelope.error_type, err
            )
        });
        Self::Error {
            status: envelope.status_code(),
            body,
        }
    }

    /// HTTP status.
    pub fn status(&self) -> u16 {
        match self {
            Self::Stream { .. } => 200,
            Self::Error { status, .. } => *status,
        }
    }

    /// HTTP headers.
    pub fn headers(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Stream { headers, .. } => headers,
            Self::Error { .. } => ERROR_HEADERS,
        }
    }

    /// Whether this is an error response.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The body as a byte stream.
    pub fn into_body(self) -> ByteStream {
        match self {
            Self::Stream { body, .. } => body,
            Self::Error { body, .. } => stream::once(async move { Ok(Bytes::from(body)) }).boxed(),
        }
    }
}

/// Dispatch `request` and relay the response.
///
/// `configure` sets up the pipeline (callbacks, handler, mode, data). A
/// dispatch failure is logged and answered with its error envelope.
pub async fn relay<D, F>(dispatcher: &D, request: ChatRequest, configure: F) -> RelayResponse
where
    D: Dispatcher + ?Sized,
    F: FnOnce(OpenAIStream) -> OpenAIStream,
{
    match dispatcher.dispatch(request).await {
        Ok(source) => configure(OpenAIStream::new(source)).into_response(),
        Err(envelope) => {
            error!(
                endpoint = %envelope.body.endpoint,
                error_type = %envelope.error_type,
                status = envelope.status_code(),
                "relay dispatch failed"
            );
            RelayResponse::from_error(&envelope)
        }
    }
}
