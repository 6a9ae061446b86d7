//! The `OpenAIStream` pipeline builder.

use crate::response::RelayResponse;
use relay_ai_core::{ChatRequest, Result};
use relay_ai_providers::Dispatcher;
use relay_ai_streaming::{EventSource, FunctionCallHandler, FunctionCallStream, StreamCallbacks};
use relay_ai_ui::{DataReceiver, OutputMultiplexer, StreamMode};
use std::fmt;
use std::sync::Arc;

/// Builds the output pipeline for one upstream completion stream.
///
/// ```ignore
/// let response = OpenAIStream::new(source)
///     .with_callbacks(StreamCallbacks::new().with_on_final(|text| save(text)))
///     .with_handler(handler)
///     .with_mode(StreamMode::Envelope)
///     .into_response();
/// ```
pub struct OpenAIStream {
    source: EventSource,
    callbacks: StreamCallbacks,
    handler: Option<Arc<dyn FunctionCallHandler>>,
    mode: StreamMode,
    data: Option<DataReceiver>,
}

impl fmt::Debug for OpenAIStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIStream")
            .field("source", &self.source)
            .field("callbacks", &self.callbacks)
            .field("has_handler", &self.handler.is_some())
            .field("mode", &self.mode)
            .field("has_data", &self.data.is_some())
            .finish()
    }
}

impl OpenAIStream {
    /// Create a pipeline over an upstream source.
    pub fn new(source: EventSource) -> Self {
        Self {
            source,
            callbacks: StreamCallbacks::default(),
            handler: None,
            mode: StreamMode::default(),
            data: None,
        }
    }

    /// Dispatch `request` and build a pipeline over the response.
    pub async fn from_dispatch<D>(dispatcher: &D, request: ChatRequest) -> Result<Self>
    where
        D: Dispatcher + ?Sized,
    {
        let source = dispatcher.dispatch(request).await?;
        Ok(Self::new(source))
    }

    /// Set the lifecycle callbacks.
    #[must_use]
    pub fn with_callbacks(mut self, callbacks: StreamCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Set the function-call handler.
    #[must_use]
    pub fn with_handler(self, handler: impl FunctionCallHandler + 'static) -> Self {
        self.with_shared_handler(Arc::new(handler))
    }

    /// Set a shared function-call handler.
    #[must_use]
    pub fn with_shared_handler(mut self, handler: Arc<dyn FunctionCallHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Set the byte encoding.
    #[must_use]
    pub fn with_mode(mut self, mode: StreamMode) -> Self {
        self.mode = mode;
        self
    }

    /// Interleave out-of-band data into the byte stream.
    #[must_use]
    pub fn with_data(mut self, data: DataReceiver) -> Self {
        self.data = Some(data);
        self
    }

    /// The event stream, without byte encoding. Out-of-band data is not
    /// part of it.
    pub fn into_events(self) -> FunctionCallStream {
        self.split().0
    }

    /// The encoded byte stream.
    pub fn into_byte_stream(self) -> OutputMultiplexer<FunctionCallStream> {
        let mode = self.mode;
        let (events, data) = self.split();
        let multiplexer = OutputMultiplexer::new(events, mode);
        match data {
            Some(data) => multiplexer.with_data(data),
            None => multiplexer,
        }
    }

    /// A streaming response. Stream-data headers are sent in envelope
    /// mode or when a data channel is attached.
    pub fn into_response(self) -> RelayResponse {
        let body = self.into_byte_stream();
        RelayResponse::stream(body.headers(), body)
    }

    fn split(self) -> (FunctionCallStream, Option<DataReceiver>) {
        let mut events = FunctionCallStream::new(self.source).with_callbacks(self.callbacks);
        if let Some(handler) = self.handler {
            events = events.with_shared_handler(handler);
        }
        (events, self.data)
    }
}
