//! OpenAI chat completions dispatcher.

use crate::config::ProviderConfig;
use crate::dispatcher::{DispatchError, Dispatcher};
use async_trait::async_trait;
use futures::TryStreamExt;
use relay_ai_core::{ChatRequest, ErrorEnvelope};
use relay_ai_streaming::{EventSource, StreamError};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

/// Dispatcher for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAIDispatcher {
    config: ProviderConfig,
    client: Client,
    endpoint: String,
}

impl OpenAIDispatcher {
    /// Create a dispatcher with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(ProviderConfig::new().with_api_key(api_key))
    }

    /// Create from configuration.
    ///
    /// A missing API key is reported per request as a `NoAPIKey` envelope.
    pub fn from_config(config: ProviderConfig) -> Self {
        Self {
            client: config.build_client(),
            endpoint: format!("{}/chat/completions", config.base_url()),
            config,
        }
    }

    /// Create from `OPENAI_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_config(ProviderConfig::from_env("OPENAI"))
    }

    /// Configuration in use.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn send(&self, request: &ChatRequest) -> Result<EventSource, DispatchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(DispatchError::MissingApiKey)?;

        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header(ACCEPT, "text/event-stream")
            .json(request);

        if let Some(org) = &self.config.organization {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(DispatchError::Upstream { status, body });
        }

        let byte_stream = response
            .bytes_stream()
            .map_err(|e| StreamError::Connection(e.to_string()));

        Ok(EventSource::from_sse(byte_stream))
    }
}

#[async_trait]
impl Dispatcher for OpenAIDispatcher {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn dispatch(&self, request: ChatRequest) -> Result<EventSource, ErrorEnvelope> {
        debug!(
            endpoint = %self.endpoint,
            model = %request.model,
            messages = request.messages.len(),
            "dispatching chat request"
        );

        self.send(&request).await.map_err(|err| {
            let envelope = err.into_envelope(&self.endpoint);
            warn!(error = %envelope, "dispatch failed");
            envelope
        })
    }
}
