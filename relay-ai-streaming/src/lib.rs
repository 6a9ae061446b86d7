//! # relay-ai-streaming
//!
//! Pull-driven transform from an OpenAI-style completion stream into a
//! normalized stream of text, function-call and data events.
//!
//! ## Core Concepts
//!
//! - **[`EventSource`]**: Upstream input, either decoded JSON events or raw SSE bytes
//! - **[`ChunkClassifier`]**: Tells chat chunks from legacy completion chunks
//! - **[`TextExtractor`]**: Linearizes chunks into text, rendering function calls inline
//! - **[`FunctionCallStream`]**: Buffers function calls and splices handler continuations
//! - **[`StreamCallbacks`]**: Lifecycle hooks with a once-only `on_final`
//!
//! ## Example
//!
//! ```ignore
//! use relay_ai_streaming::prelude::*;
//! use futures::StreamExt;
//!
//! let source = EventSource::from_sse(response.bytes_stream());
//! let mut stream = FunctionCallStream::new(source)
//!     .with_callbacks(StreamCallbacks::new().with_on_final(|text| println!("\n{text}")));
//!
//! while let Some(event) = stream.next().await {
//!     if let Some(text) = event?.as_text() {
//!         print!("{text}");
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod aggregator;
pub mod callbacks;
pub mod chunk;
pub mod error;
pub mod events;
pub mod extract;
pub mod handler;
pub mod source;
pub mod sse;

// Re-exports
pub use aggregator::{AggregationState, FunctionCallStream};
pub use callbacks::{CallbackDriver, StreamCallbacks};
pub use chunk::{
    chunk_shape, classify, ChatChoice, ChatChunk, ChatDelta, ChunkClassifier, ChunkShape,
    LegacyChoice, LegacyChunk, ProviderChunk,
};
pub use error::{StreamError, StreamResult};
pub use events::{OutputEvent, OutputKind};
pub use extract::{
    escape_json_fragment, text_stream, StartTrimmer, TextExtractor, TextStream,
    FUNCTION_CALL_PREFIX, FUNCTION_CALL_SUFFIX,
};
pub use handler::{Continuation, FunctionCallHandler, FunctionCallOutcome, MessageBuilder};
pub use source::EventSource;
pub use sse::{SseEvent, SseParser, SseStream};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        Continuation, EventSource, FunctionCallHandler, FunctionCallOutcome, FunctionCallStream,
        MessageBuilder, OutputEvent, OutputKind, StreamCallbacks, StreamError, StreamResult,
    };
}
