//! Output multiplexing for relay-ai.
//!
//! Turns the normalized event stream into response bytes:
//!
//! - **[`protocol`]**: the `"<code>:<json>\n"` stream-part line format
//! - **[`data`]**: the [`StreamData`] out-of-band channel
//! - **[`multiplexer`]**: [`OutputMultiplexer`], the byte stream itself
//!
//! # Example
//!
//! ```ignore
//! use relay_ai_ui::{OutputMultiplexer, StreamData, StreamMode};
//!
//! let (data, rx) = StreamData::channel();
//! let body = OutputMultiplexer::new(events, StreamMode::Envelope).with_data(rx);
//!
//! data.append(&serde_json::json!({"status": "searching"}))?;
//! data.close();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod data;
pub mod multiplexer;
pub mod protocol;

pub use data::{DataError, DataReceiver, StreamData};
pub use multiplexer::{OutputMultiplexer, StreamMode};
pub use protocol::{
    encode_event, format_stream_part, parse_stream_part, ProtocolError, StreamPart,
    StreamPartKind, STREAM_DATA_HEADERS, TEXT_STREAM_HEADERS,
};
