//! Configuration for the remote agent runtime and the classifier model.

use std::env;
use std::time::Duration;

use agent_core::{AgentError, ModelError};

/// Default request timeout for both endpoints, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings shared by every [`crate::HttpAgent`].
#[derive(Debug, Clone)]
pub struct HttpAgentConfig {
    /// Base URL of the agent runtime (the `/invoke` path is appended).
    pub runtime_url: String,

    /// Optional bearer token.
    pub api_key: Option<String>,

    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl HttpAgentConfig {
    pub fn new(runtime_url: impl Into<String>) -> Self {
        Self {
            runtime_url: runtime_url.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `AGENT_RUNTIME_URL` - Base URL of the agent runtime
    ///
    /// Optional environment variables:
    /// - `AGENT_RUNTIME_API_KEY` - Bearer token
    /// - `AGENT_RUNTIME_TIMEOUT_SECS` - Request timeout (default: 30)
    pub fn from_env() -> Result<Self, AgentError> {
        let runtime_url = env::var("AGENT_RUNTIME_URL")
            .map_err(|_| AgentError::Configuration("AGENT_RUNTIME_URL not set".to_string()))?;

        let api_key = env::var("AGENT_RUNTIME_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let timeout = env::var("AGENT_RUNTIME_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            runtime_url,
            api_key,
            timeout,
        })
    }

    /// Set the bearer token.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn invoke_url(&self) -> String {
        format!("{}/invoke", self.runtime_url.trim_end_matches('/'))
    }
}

/// Configuration for [`crate::ChatCompletionModel`].
#[derive(Debug, Clone)]
pub struct ChatModelConfig {
    /// OpenAI-compatible API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for the classification answer.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Nucleus sampling cutoff.
    pub top_p: f32,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ChatModelConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            top_p: 0.9,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ChatModelConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `CLASSIFIER_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `CLASSIFIER_API_URL` - API URL (default: https://api.openai.com)
    /// - `CLASSIFIER_MODEL` - Model name (default: gpt-4o-mini)
    /// - `CLASSIFIER_MAX_TOKENS` - Max tokens (default: 500)
    /// - `CLASSIFIER_TEMPERATURE` - Temperature (default: 0.7)
    /// - `CLASSIFIER_TOP_P` - Top-p (default: 0.9)
    /// - `CLASSIFIER_TIMEOUT_SECS` - Request timeout (default: 30)
    pub fn from_env() -> Result<Self, ModelError> {
        let defaults = Self::default();

        let api_key = env::var("CLASSIFIER_API_KEY")
            .map_err(|_| ModelError::Configuration("CLASSIFIER_API_KEY not set".to_string()))?;

        let api_url = env::var("CLASSIFIER_API_URL").unwrap_or(defaults.api_url);

        let model = env::var("CLASSIFIER_MODEL").unwrap_or(defaults.model);

        let max_tokens = env::var("CLASSIFIER_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_tokens);

        let temperature = env::var("CLASSIFIER_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.temperature);

        let top_p = env::var("CLASSIFIER_TOP_P")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.top_p);

        let timeout = env::var("CLASSIFIER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Ok(Self {
            api_url,
            api_key,
            model,
            max_tokens,
            temperature,
            top_p,
            timeout,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> ChatModelConfigBuilder {
        ChatModelConfigBuilder::default()
    }

    pub(crate) fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.api_url.trim_end_matches('/')
        )
    }
}

/// Builder for ChatModelConfig.
#[derive(Debug, Default)]
pub struct ChatModelConfigBuilder {
    config: ChatModelConfig,
}

impl ChatModelConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = temp;
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.config.top_p = top_p;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> ChatModelConfig {
        self.config
    }
}
