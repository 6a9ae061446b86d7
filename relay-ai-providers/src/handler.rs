//! Function-call handler that dispatches continuations.

use crate::dispatcher::Dispatcher;
use async_trait::async_trait;
use relay_ai_core::{ChatRequest, FunctionCallPayload};
use relay_ai_streaming::{Continuation, FunctionCallHandler, FunctionCallOutcome, MessageBuilder};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Runs a function and continues the conversation with its result.
///
/// The executor returns `Ok(None)` to decline a call, which emits the call
/// event unchanged. Otherwise the result is appended to the conversation
/// and a continuation request is dispatched with the same parameters as
/// the original request.
pub struct DispatchingHandler<F> {
    executor: F,
    dispatcher: Arc<dyn Dispatcher>,
    request: ChatRequest,
}

impl<F> fmt::Debug for DispatchingHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchingHandler")
            .field("endpoint", &self.dispatcher.endpoint())
            .field("model", &self.request.model)
            .finish()
    }
}

impl<F, Fut> DispatchingHandler<F>
where
    F: Fn(FunctionCallPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
{
    /// Create a handler continuing `request` through `dispatcher`.
    pub fn new(dispatcher: Arc<dyn Dispatcher>, request: ChatRequest, executor: F) -> Self {
        Self {
            executor,
            dispatcher,
            request,
        }
    }
}

#[async_trait]
impl<F, Fut> FunctionCallHandler for DispatchingHandler<F>
where
    F: Fn(FunctionCallPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
{
    async fn on_function_call(
        &self,
        call: FunctionCallPayload,
        messages: MessageBuilder,
    ) -> anyhow::Result<FunctionCallOutcome> {
        let name = call.name.clone();
        let Some(result) = (self.executor)(call).await? else {
            debug!(function = %name, "executor declined function call");
            return Ok(FunctionCallOutcome::Emit);
        };

        let built = messages.build(&result)?;
        let request = self.request.continuation(built.iter().cloned());
        debug!(
            function = %name,
            messages = request.messages.len(),
            "dispatching continuation"
        );

        let source = self.dispatcher.dispatch(request).await?;
        Ok(FunctionCallOutcome::Continue(Continuation::new(built, source)))
    }
}
