//! Function-call handler interface.

use crate::source::EventSource;
use async_trait::async_trait;
use relay_ai_core::{FunctionCall, FunctionCallPayload, Message};
use serde::Serialize;
use std::future::Future;

/// What to do with a completed function call.
#[derive(Debug)]
pub enum FunctionCallOutcome {
    /// Emit the function call event downstream unchanged.
    Emit,
    /// Emit this text instead of the call.
    Text(String),
    /// Splice a new upstream stream into the output.
    Continue(Continuation),
}

/// A continuation of the conversation after a function call.
#[derive(Debug)]
pub struct Continuation {
    /// Function-call messages accumulated so far, as built by
    /// [`MessageBuilder::build`]. Seeds the builder for any further call.
    pub messages: Vec<Message>,
    /// The new upstream stream.
    pub source: EventSource,
}

impl Continuation {
    /// Create a continuation.
    pub fn new(messages: Vec<Message>, source: EventSource) -> Self {
        Self { messages, source }
    }
}

/// Builds the function-call messages for a continuation request.
///
/// The result holds the function-call turns of earlier continuations in
/// this stream followed by the assistant call and the function result.
/// It does not include the original conversation.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    prior: Vec<Message>,
    call: FunctionCall,
}

impl MessageBuilder {
    /// Create a builder.
    pub fn new(prior: Vec<Message>, call: FunctionCall) -> Self {
        Self { prior, call }
    }

    /// The function call as it was streamed (arguments as JSON text).
    pub fn call(&self) -> &FunctionCall {
        &self.call
    }

    /// Function-call messages from earlier continuations.
    pub fn prior(&self) -> &[Message] {
        &self.prior
    }

    /// Build the extended message list for a function result.
    pub fn build<T: Serialize + ?Sized>(&self, result: &T) -> Result<Vec<Message>, serde_json::Error> {
        let content = serde_json::to_string(result)?;
        let name = self.call.name.clone().unwrap_or_default();

        let mut messages = self.prior.clone();
        messages.push(Message::assistant_function_call(self.call.clone()));
        messages.push(Message::function(name, content));
        Ok(messages)
    }
}

/// Handles completed function calls.
///
/// Invoked exactly once per completed call. Returning
/// [`FunctionCallOutcome::Continue`] splices the new stream into the
/// output; its own function calls come back to the same handler.
#[async_trait]
pub trait FunctionCallHandler: Send + Sync {
    /// Handle a completed function call.
    async fn on_function_call(
        &self,
        call: FunctionCallPayload,
        messages: MessageBuilder,
    ) -> anyhow::Result<FunctionCallOutcome>;
}

#[async_trait]
impl<F, Fut> FunctionCallHandler for F
where
    F: Fn(FunctionCallPayload, MessageBuilder) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<FunctionCallOutcome>> + Send + 'static,
{
    async fn on_function_call(
        &self,
        call: FunctionCallPayload,
        messages: MessageBuilder,
    ) -> anyhow::Result<FunctionCallOutcome> {
        (self)(call, messages).await
    }
}
