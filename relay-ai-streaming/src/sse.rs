//! Server-Sent Events framing for upstream completion bodies.
//!
//! Bytes are held until a full frame has arrived, so a UTF-8 sequence
//! split across two reads decodes intact.

use crate::error::{StreamError, StreamResult};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Upper bound on bytes held while waiting for a frame delimiter.
const FRAME_LIMIT: usize = 10 * 1024 * 1024;

const DONE_SENTINEL: &str = "[DONE]";

/// One decoded SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `event:` field.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
    /// `id:` field.
    pub id: Option<String>,
    /// `retry:` field in milliseconds.
    pub retry: Option<u64>,
}

impl SseEvent {
    /// A frame carrying only `data`.
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
            id: None,
            retry: None,
        }
    }

    /// Attach an event name.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Whether the frame terminates the completion.
    pub fn is_done(&self) -> bool {
        self.data.trim() == DONE_SENTINEL || matches!(self.event.as_deref(), Some("done"))
    }

    /// Deserialize the payload.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}

/// Incremental frame decoder.
#[derive(Debug, Default)]
pub struct SseParser {
    pending: Vec<u8>,
    ready: VecDeque<SseEvent>,
    last_event_id: Option<String>,
}

impl SseParser {
    /// An empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and decode every frame they complete.
    ///
    /// Decoded frames are queued for [`next_event`](Self::next_event); the
    /// number of newly queued frames is returned.
    pub fn feed(&mut self, bytes: &[u8]) -> StreamResult<usize> {
        self.pending.extend_from_slice(bytes);
        if self.pending.len() > FRAME_LIMIT {
            return Err(StreamError::BufferOverflow);
        }
        self.drain_frames()
    }

    /// [`feed`](Self::feed) for text input.
    pub fn feed_str(&mut self, text: &str) -> StreamResult<usize> {
        self.feed(text.as_bytes())
    }

    /// Decode whatever is left once the body has ended.
    pub fn finish(&mut self) -> StreamResult<usize> {
        let mut queued = self.drain_frames()?;
        let tail = std::mem::take(&mut self.pending);
        let tail = decode_frame(&tail)?;
        if let Some(event) = parse_frame(tail.trim_end_matches(['\n', '\r'])) {
            self.enqueue(event);
            queued += 1;
        }
        Ok(queued)
    }

    /// Pop the oldest decoded frame.
    pub fn next_event(&mut self) -> Option<SseEvent> {
        self.ready.pop_front()
    }

    /// Whether decoded frames are waiting.
    pub fn has_events(&self) -> bool {
        !self.ready.is_empty()
    }

    /// The most recent `id:` seen.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    fn enqueue(&mut self, event: SseEvent) {
        if event.id.is_some() {
            self.last_event_id.clone_from(&event.id);
        }
        self.ready.push_back(event);
    }

    fn drain_frames(&mut self) -> StreamResult<usize> {
        let mut queued = 0;
        while let Some((len, delimiter)) = frame_end(&self.pending) {
            let raw: Vec<u8> = self.pending.drain(..len + delimiter).collect();
            if let Some(event) = parse_frame(&decode_frame(&raw[..len])?) {
                self.enqueue(event);
                queued += 1;
            }
        }
        Ok(queued)
    }
}

/// End of the first complete frame: `(frame_len, delimiter_len)`.
fn frame_end(buffer: &[u8]) -> Option<(usize, usize)> {
    [&b"\n\n"[..], &b"\r\n\r\n"[..]]
        .into_iter()
        .filter_map(|delimiter| {
            buffer
                .windows(delimiter.len())
                .position(|window| window == delimiter)
                .map(|pos| (pos, delimiter.len()))
        })
        .min_by_key(|(pos, _)| *pos)
}

/// Parse one frame. Frames without a `data` field produce no event.
fn parse_frame(frame: &str) -> Option<SseEvent> {
    let mut event = SseEvent::data(String::new());
    let mut data_lines: Vec<&str> = Vec::new();

    for line in frame.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => data_lines.push(value),
            "event" => event.event = Some(value.to_string()),
            "id" => event.id = Some(value.to_string()),
            "retry" => event.retry = value.trim().parse().ok(),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return None;
    }
    event.data = data_lines.join("\n");
    Some(event)
}

fn decode_frame(frame: &[u8]) -> StreamResult<String> {
    std::str::from_utf8(frame)
        .map(str::to_owned)
        .map_err(|e| StreamError::ParseSse(e.to_string()))
}

pin_project! {
    /// Decodes a byte body into [`SseEvent`]s.
    pub struct SseStream<S> {
        #[pin]
        body: S,
        parser: SseParser,
        ended: bool,
    }
}

impl<S, E> SseStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<StreamError>,
{
    /// Wrap a byte body.
    pub fn new(body: S) -> Self {
        Self {
            body,
            parser: SseParser::new(),
            ended: false,
        }
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<StreamError>,
{
    type Item = StreamResult<SseEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        while !this.parser.has_events() {
            if *this.ended {
                return Poll::Ready(None);
            }
            let decoded = match futures::ready!(this.body.poll_next_unpin(cx)) {
                Some(Ok(bytes)) => this.parser.feed(&bytes),
                Some(Err(err)) => Err(err.into()),
                None => {
                    *this.ended = true;
                    this.parser.finish()
                }
            };
            if let Err(err) = decoded {
                *this.ended = true;
                return Poll::Ready(Some(Err(err)));
            }
        }

        Poll::Ready(this.parser.next_event().map(Ok))
    }
}
