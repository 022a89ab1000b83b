//! Classifier model over an OpenAI-compatible chat-completion endpoint.

use agent_core::{async_trait, ClassifierModel, ClassifierPrompt, ModelError};
use reqwest::Client;
use tracing::{debug, info};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::ChatModelConfig;
use crate::http_agent::is_retryable_status;

/// Sends the rendered classifier prompt as a system + user message pair and
/// returns the first choice's text verbatim.
pub struct ChatCompletionModel {
    client: Client,
    config: ChatModelConfig,
}

impl ChatCompletionModel {
    pub fn new(config: ChatModelConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            model = %config.model,
            max_tokens = config.max_tokens,
            temperature = config.temperature,
            top_p = config.top_p,
            "ChatCompletionModel initialized"
        );

        Ok(Self { client, config })
    }

    /// Create a model client from environment variables.
    ///
    /// See [`ChatModelConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, ModelError> {
        Self::new(ChatModelConfig::from_env()?)
    }

    pub fn config(&self) -> &ChatModelConfig {
        &self.config
    }

    fn build_request(&self, prompt: &ClassifierPrompt) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(prompt.system.clone()),
                ChatMessage::user(prompt.user.clone()),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        }
    }
}

#[async_trait]
impl ClassifierModel for ChatCompletionModel {
    async fn raw_classify(&self, prompt: &ClassifierPrompt) -> Result<String, ModelError> {
        let request = self.build_request(prompt);

        let response = self
            .client
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);
            let message = format!("API error ({}): {}", status.as_u16(), detail);
            return Err(if is_retryable_status(status) {
                ModelError::Unavailable(message)
            } else {
                ModelError::Rejected(message)
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelError::InvalidResponse("No content in response".to_string()))?;

        debug!(chars = text.len(), "Classifier model answered");
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
