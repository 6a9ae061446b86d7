//! Request dispatchers for relay-ai.
//!
//! A [`Dispatcher`] turns a [`ChatRequest`](relay_ai_core::ChatRequest)
//! into a streaming [`EventSource`](relay_ai_streaming::EventSource), or
//! an [`ErrorEnvelope`](relay_ai_core::ErrorEnvelope) describing why it
//! could not:
//!
//! - **[`OpenAIDispatcher`]** - OpenAI-compatible `/chat/completions` over HTTP
//! - **[`MockDispatcher`]** - Canned responses for tests
//! - **[`DispatchingHandler`]** - Runs functions and dispatches continuations
//!
//! ## Example
//!
//! ```rust,ignore
//! use relay_ai_providers::{Dispatcher, OpenAIDispatcher};
//! use relay_ai_core::{ChatRequest, Message};
//!
//! let dispatcher = OpenAIDispatcher::from_env();
//! let request = ChatRequest::new("gpt-3.5-turbo", vec![Message::user("Hello")]);
//! let source = dispatcher.dispatch(request).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod config;
mod dispatcher;
mod handler;
mod mock;
mod openai;

// Re-exports
pub use config::{ProviderConfig, DEFAULT_BASE_URL};
pub use dispatcher::{BoxedDispatcher, DispatchError, Dispatcher};
pub use handler::DispatchingHandler;
pub use mock::MockDispatcher;
pub use openai::OpenAIDispatcher;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        BoxedDispatcher, Dispatcher, DispatchingHandler, OpenAIDispatcher, ProviderConfig,
    };
}
