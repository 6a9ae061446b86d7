//! Dispatcher configuration.

use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for an HTTP dispatcher.
///
/// Every field is optional; unset fields fall back to the dispatcher's
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Bearer token sent with each request.
    pub api_key: Option<String>,
    /// Override for [`DEFAULT_BASE_URL`].
    pub base_url: Option<String>,
    /// Whole-request timeout, including the streamed body.
    pub timeout: Option<Duration>,
    /// Sent as the `OpenAI-Organization` header.
    pub organization: Option<String>,
}

impl ProviderConfig {
    /// A config with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `key` as the bearer token.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Send requests under `url`.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Bound each request by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Bill requests to `org`.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Read `{prefix}_API_KEY`, `{prefix}_BASE_URL`,
    /// `{prefix}_ORGANIZATION` and `{prefix}_TIMEOUT_SECS`.
    ///
    /// Missing or unparsable variables are left unset.
    pub fn from_env(prefix: &str) -> Self {
        let var = |name: &str| std::env::var(format!("{}_{}", prefix, name)).ok();
        Self {
            api_key: var("API_KEY"),
            base_url: var("BASE_URL"),
            organization: var("ORGANIZATION"),
            timeout: var("TIMEOUT_SECS")
                .and_then(|secs| secs.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// An HTTP client honoring the timeout.
    ///
    /// If the client cannot be built, a default client without the
    /// timeout is used and a warning is logged.
    pub fn build_client(&self) -> Client {
        let builder = self
            .timeout
            .map_or_else(Client::builder, |timeout| Client::builder().timeout(timeout));
        builder.build().unwrap_or_else(|err| {
            warn!(
                error = %err,
                timeout = ?self.timeout,
                "failed to build configured HTTP client, falling back to defaults"
            );
            Client::new()
        })
    }
}
