//! Out-of-band data channel.
//!
//! [`StreamData`] lets the caller push JSON values into a response while
//! the model output is still streaming. The multiplexer drains the
//! matching [`DataReceiver`] between upstream events and keeps the
//! response open until every [`StreamData`] handle is closed or dropped.

use serde::Serialize;
use serde_json::Value;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from [`StreamData::append`].
#[derive(Debug, Error)]
pub enum DataError {
    /// The value could not be serialized.
    #[error("Failed to serialize stream data: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response side is gone.
    #[error("Stream data receiver closed")]
    Closed,
}

/// Caller-side handle for appending data to a response.
#[derive(Debug, Clone)]
pub struct StreamData {
    tx: mpsc::UnboundedSender<Value>,
}

impl StreamData {
    /// Create a connected handle and receiver.
    #[must_use]
    pub fn channel() -> (Self, DataReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, DataReceiver { rx })
    }

    /// Append one value.
    pub fn append<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), DataError> {
        let value = serde_json::to_value(value)?;
        self.tx.send(value).map_err(|_| DataError::Closed)
    }

    /// Close this handle. The response ends once all clones are closed.
    pub fn close(self) {}

    /// Whether the receiving side has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Response-side end of a [`StreamData`] channel.
#[derive(Debug)]
pub struct DataReceiver {
    rx: mpsc::UnboundedReceiver<Value>,
}

impl DataReceiver {
    /// Take every value that is ready now.
    ///
    /// Returns `Ready(Some(batch))` with at least one value, `Ready(None)`
    /// once all handles are closed and the channel is empty, and `Pending`
    /// otherwise (the waker is registered).
    pub fn poll_batch(&mut self, cx: &mut Context<'_>) -> Poll<Option<Vec<Value>>> {
        let mut batch = Vec::new();
        loop {
            match self.rx.poll_recv(cx) {
                Poll::Ready(Some(value)) => batch.push(value),
                Poll::Ready(None) | Poll::Pending if !batch.is_empty() => {
                    return Poll::Ready(Some(batch))
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
