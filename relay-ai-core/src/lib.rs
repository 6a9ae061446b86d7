//! # relay-ai-core
//!
//! Core types shared by the relay-ai crates:
//!
//! - **Messages**: [`Message`], [`Role`], and function-call fragments
//! - **Requests**: the [`ChatRequest`] dispatch payload
//! - **Errors**: [`ErrorEnvelope`] classification and [`RelayError`]
//!
//! ## Example
//!
//! ```rust
//! use relay_ai_core::{ChatRequest, FunctionCall, Message};
//!
//! let request = ChatRequest::new("gpt-3.5-turbo-0613", vec![Message::user("Weather in Oslo?")])
//!     .with_temperature(0.2);
//!
//! // After the model called a function, feed the result back.
//! let next = request.continuation(vec![
//!     Message::assistant_function_call(FunctionCall::new("get_weather", r#"{"city":"Oslo"}"#)),
//!     Message::function("get_weather", r#"{"temp":4}"#),
//! ]);
//! assert_eq!(next.messages.len(), 3);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod errors;
pub mod messages;
pub mod request;

pub use errors::{ErrorBody, ErrorEnvelope, ErrorType, RelayError, Result};
pub use messages::{FunctionCall, FunctionCallPayload, Message, Role};
pub use request::ChatRequest;

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::errors::{ErrorEnvelope, ErrorType, RelayError, Result};
    pub use crate::messages::{FunctionCall, FunctionCallPayload, Message, Role};
    pub use crate::request::ChatRequest;
}
