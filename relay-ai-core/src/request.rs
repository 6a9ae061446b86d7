//! Dispatch payload.

use crate::messages::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload handed to a request dispatcher.
///
/// Provider parameters that have no dedicated field are kept in `extra`
/// and flattened into the serialized body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model to use.
    pub model: String,
    /// Messages in the conversation.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
    /// Function definitions offered to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<Value>>,
    /// Function call strategy (`"auto"`, `"none"` or `{"name": ...}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<Value>,
    /// Whether to stream the response.
    #[serde(default = "default_stream")]
    pub stream: bool,
    /// Additional provider parameters.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_stream() -> bool {
    true
}

impl ChatRequest {
    /// Create a new streaming request.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            functions: None,
            function_call: None,
            stream: true,
            extra: Map::new(),
        }
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set top_p.
    #[must_use]
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Offer function definitions to the model.
    #[must_use]
    pub fn with_functions(mut self, functions: Vec<Value>) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Set the function call strategy.
    #[must_use]
    pub fn with_function_call(mut self, function_call: Value) -> Self {
        self.function_call = Some(function_call);
        self
    }

    /// Set an additional provider parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Build the request for a continuation: same parameters, with
    /// `messages` appended to the conversation. Streaming is forced on.
    #[must_use]
    pub fn continuation(&self, messages: impl IntoIterator<Item = Message>) -> Self {
        let mut next = self.clone();
        next.messages.extend(messages);
        next.stream = true;
        next
    }
}
