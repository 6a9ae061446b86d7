//! Live upstream event sources.
//!
//! A dispatcher hands back either an already-decoded sequence of provider
//! events or the raw SSE body of an HTTP response. Both are normalized to
//! one stream of JSON events.

use crate::error::{StreamError, StreamResult};
use crate::sse::SseStream;
use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{future, Stream, StreamExt, TryStreamExt};
use serde_json::Value;
use std::fmt;

/// A live upstream event source.
pub enum EventSource {
    /// Decoded provider events.
    Events(BoxStream<'static, StreamResult<Value>>),
    /// SSE-framed response body.
    Sse(BoxStream<'static, StreamResult<Bytes>>),
}

impl fmt::Debug for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Events(_) => f.write_str("EventSource::Events(..)"),
            Self::Sse(_) => f.write_str("EventSource::Sse(..)"),
        }
    }
}

impl EventSource {
    /// Wrap a stream of decoded provider events.
    pub fn from_events<S>(events: S) -> Self
    where
        S: Stream<Item = StreamResult<Value>> + Send + 'static,
    {
        Self::Events(events.boxed())
    }

    /// Wrap a fixed list of decoded provider events.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let values: Vec<StreamResult<Value>> = values.into_iter().map(Ok).collect();
        Self::Events(stream::iter(values).boxed())
    }

    /// Wrap an SSE-framed byte stream.
    pub fn from_sse<S, E>(body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<StreamError> + 'static,
    {
        Self::Sse(body.map_err(Into::<StreamError>::into).boxed())
    }

    /// Normalize into a stream of decoded JSON events.
    ///
    /// For SSE bodies the `[DONE]` sentinel ends the sequence and blank
    /// data payloads are skipped. A payload that is not JSON is an error.
    pub fn into_events(self) -> BoxStream<'static, StreamResult<Value>> {
        match self {
            Self::Events(events) => events,
            Self::Sse(body) => SseStream::new(body)
                .try_take_while(|event| future::ready(Ok(!event.is_done())))
                .try_filter(|event| future::ready(!event.data.trim().is_empty()))
                .and_then(|event| future::ready(event.parse_data::<Value>().map_err(StreamError::from)))
                .boxed(),
        }
    }
}
