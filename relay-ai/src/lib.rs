//! # relay-ai - Relay OpenAI-style completion streams
//!
//! relay-ai turns a streaming chat completion into a clean output stream
//! for a client: text passes through as it arrives, streamed function
//! calls are reassembled, and a registered handler can run the function
//! and splice the model's follow-up answer into the same response.
//!
//! ## Quick Start
//!
//! ```ignore
//! use relay_ai::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = OpenAIDispatcher::from_env();
//!     let request = ChatRequest::new("gpt-3.5-turbo", vec![Message::user("Hello!")]);
//!
//!     let response = relay(&dispatcher, request, |stream| {
//!         stream
//!             .with_mode(StreamMode::Envelope)
//!             .with_callbacks(StreamCallbacks::new().with_on_final(|text| println!("{text}")))
//!     })
//!     .await;
//!
//!     let mut body = response.into_body();
//!     while let Some(bytes) = body.next().await {
//!         print!("{}", String::from_utf8_lossy(&bytes?));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! relay-ai is organized as a workspace of focused crates:
//!
//! - [`relay_ai_core`] - Messages, dispatch payload, error envelope
//! - [`relay_ai_streaming`] - SSE, chunk classification, text extraction, function-call aggregation
//! - [`relay_ai_ui`] - Output multiplexer and stream-part line format
//! - [`relay_ai_providers`] - Dispatchers and the continuation handler

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod response;
pub mod stream;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Messages, requests and errors.
pub use relay_ai_core as core;

/// Stream transform.
pub use relay_ai_streaming as streaming;

/// Output encoding.
pub use relay_ai_ui as ui;

/// Dispatchers.
pub use relay_ai_providers as providers;

// ============================================================================
// Type Re-exports
// ============================================================================

pub use relay_ai_core::{
    ChatRequest, ErrorEnvelope, ErrorType, FunctionCall, FunctionCallPayload, Message,
    RelayError, Result, Role,
};
pub use relay_ai_providers::{
    Dispatcher, DispatchingHandler, MockDispatcher, OpenAIDispatcher, ProviderConfig,
};
pub use relay_ai_streaming::{
    Continuation, EventSource, FunctionCallHandler, FunctionCallOutcome, FunctionCallStream,
    MessageBuilder, OutputEvent, StreamCallbacks, StreamError,
};
pub use relay_ai_ui::{DataReceiver, OutputMultiplexer, StreamData, StreamMode};
pub use response::{relay, ByteStream, RelayResponse};
pub use stream::OpenAIStream;

// ============================================================================
// Prelude Module
// ============================================================================

/// Convenient prelude for common imports.
///
/// ```ignore
/// use relay_ai::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        relay, ChatRequest, Continuation, Dispatcher, DispatchingHandler, ErrorEnvelope,
        EventSource, FunctionCallOutcome, FunctionCallPayload, Message, MessageBuilder,
        OpenAIDispatcher, OpenAIStream, OutputEvent, ProviderConfig, RelayResponse,
        StreamCallbacks, StreamData, StreamMode,
    };
    pub use futures::StreamExt;
}
