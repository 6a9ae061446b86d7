//! Output multiplexer.
//!
//! Encodes a stream of [`OutputEvent`]s onto a single byte stream and
//! interleaves out-of-band data from a [`DataReceiver`].

use crate::data::DataReceiver;
use crate::protocol::{
    encode_event, format_stream_part, StreamPartKind, STREAM_DATA_HEADERS, TEXT_STREAM_HEADERS,
};
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use relay_ai_streaming::{OutputEvent, StreamResult};
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

/// Byte encoding of the output stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Text passes through unchanged; function calls and data use
    /// stream-part lines.
    #[default]
    Raw,
    /// Every event is a stream-part line.
    Envelope,
}

impl StreamMode {
    /// Encode one event.
    #[must_use]
    pub fn encode(&self, event: &OutputEvent) -> Bytes {
        match (self, event) {
            (Self::Raw, OutputEvent::Text(text)) => Bytes::from(text.clone()),
            _ => Bytes::from(encode_event(event)),
        }
    }
}

pin_project! {
    /// Byte stream over an output event stream.
    ///
    /// Ends once the upstream is exhausted and the data channel, if any,
    /// is closed. Upstream errors are forwarded.
    pub struct OutputMultiplexer<S> {
        #[pin]
        upstream: S,
        upstream_done: bool,
        data: Option<DataReceiver>,
        mode: StreamMode,
    }
}

impl<S> OutputMultiplexer<S>
where
    S: Stream<Item = StreamResult<OutputEvent>>,
{
    /// Create a multiplexer.
    pub fn new(upstream: S, mode: StreamMode) -> Self {
        Self {
            upstream,
            upstream_done: false,
            data: None,
            mode,
        }
    }

    /// Interleave values from a data channel.
    #[must_use]
    pub fn with_data(mut self, data: DataReceiver) -> Self {
        self.data = Some(data);
        self
    }

    /// Encoding mode.
    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// HTTP headers for this body.
    ///
    /// Plain text headers are used only for a raw stream without a data
    /// channel. Anything carrying data records advertises stream data.
    pub fn headers(&self) -> &'static [(&'static str, &'static str)] {
        match (self.mode, &self.data) {
            (StreamMode::Raw, None) => TEXT_STREAM_HEADERS,
            _ => STREAM_DATA_HEADERS,
        }
    }
}

impl<S> Stream for OutputMultiplexer<S>
where
    S: Stream<Item = StreamResult<OutputEvent>>,
{
    type Item = StreamResult<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(data) = this.data.as_mut() {
                match data.poll_batch(cx) {
                    Poll::Ready(Some(batch)) => {
                        let line = format_stream_part(StreamPartKind::Data, &Value::Array(batch));
                        return Poll::Ready(Some(Ok(Bytes::from(line))));
                    }
                    Poll::Ready(None) => {
                        debug!("stream data closed");
                        *this.data = None;
                    }
                    Poll::Pending => {}
                }
            }

            if *this.upstream_done {
                return if this.data.is_some() {
                    Poll::Pending
                } else {
                    Poll::Ready(None)
                };
            }

            match this.upstream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    return Poll::Ready(Some(Ok(this.mode.encode(&event))));
                }
                Poll::Ready(Some(Err(err))) => return Poll::Ready(Some(Err(err))),
                Poll::Ready(None) => {
                    *this.upstream_done = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
