//! Mock dispatcher for testing.
//!
//! ```rust
//! use relay_ai_providers::MockDispatcher;
//! use serde_json::json;
//!
//! let dispatcher = MockDispatcher::new("mock://chat")
//!     .with_events(vec![json!({"choices": [{"delta": {"content": "Hi"}}]})]);
//! assert_eq!(dispatcher.pending(), 1);
//! ```

use crate::dispatcher::Dispatcher;
use async_trait::async_trait;
use relay_ai_core::{ChatRequest, ErrorEnvelope};
use relay_ai_streaming::EventSource;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Response = Result<Vec<Value>, ErrorEnvelope>;

/// A dispatcher that answers from a queue of canned responses.
///
/// Clones share the queue and the request log.
#[derive(Debug, Clone)]
pub struct MockDispatcher {
    endpoint: String,
    responses: Arc<Mutex<VecDeque<Response>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockDispatcher {
    /// Create a mock with an empty queue.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a response stream of decoded events.
    #[must_use]
    pub fn with_events(self, events: Vec<Value>) -> Self {
        lock(&self.responses).push_back(Ok(events));
        self
    }

    /// Queue a dispatch failure.
    #[must_use]
    pub fn with_error(self, error: ErrorEnvelope) -> Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    /// Number of queued responses left.
    pub fn pending(&self) -> usize {
        lock(&self.responses).len()
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn dispatch(&self, request: ChatRequest) -> Result<EventSource, ErrorEnvelope> {
        lock(&self.requests).push(request);
        match lock(&self.responses).pop_front() {
            Some(Ok(events)) => Ok(EventSource::from_values(events)),
            Some(Err(error)) => Err(error),
            None => Err(ErrorEnvelope::internal(&self.endpoint, "no mock response queued")),
        }
    }
}
