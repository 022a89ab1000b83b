//! Agent backed by a remote agent runtime.

use agent_core::{async_trait, Agent, AgentError, AgentRequest, AgentResponse};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::api_types::{HistoryTurn, InvokeAgentRequest, InvokeAgentResponse};
use crate::config::HttpAgentConfig;

/// Whether a non-success status is worth retrying.
///
/// Request timeouts, throttling and server errors are transient; any other
/// client error means the request itself is wrong.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// One registered agent on a remote runtime, addressed by id and alias.
pub struct HttpAgent {
    client: Client,
    config: HttpAgentConfig,
    agent_id: String,
    alias_id: String,
}

impl HttpAgent {
    /// Create an agent with its own HTTP client.
    pub fn new(
        config: HttpAgentConfig,
        agent_id: impl Into<String>,
        alias_id: impl Into<String>,
    ) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config, agent_id, alias_id))
    }

    /// Create an agent sharing an existing client (connection pool).
    pub fn with_client(
        client: Client,
        config: HttpAgentConfig,
        agent_id: impl Into<String>,
        alias_id: impl Into<String>,
    ) -> Self {
        let agent_id = agent_id.into();
        let alias_id = alias_id.into();
        info!(
            agent_id = %agent_id,
            alias_id = %alias_id,
            runtime = %config.runtime_url,
            "HttpAgent configured"
        );
        Self {
            client,
            config,
            agent_id,
            alias_id,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn alias_id(&self) -> &str {
        &self.alias_id
    }

    fn map_send_error(&self, err: reqwest::Error) -> AgentError {
        if err.is_timeout() {
            AgentError::Timeout(self.config.timeout)
        } else {
            AgentError::Network(format!("Failed to send request: {}", err))
        }
    }
}

#[async_trait]
impl Agent for HttpAgent {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentResponse, AgentError> {
        let body = InvokeAgentRequest {
            agent_id: self.agent_id.clone(),
            alias_id: self.alias_id.clone(),
            user_id: request.user_id,
            session_id: request.session_id,
            input_text: request.user_input,
            history: HistoryTurn::from_pairs(&request.history),
        };

        debug!(agent_id = %self.agent_id, turns = body.history.len(), "Invoking remote agent");

        let mut call = self.client.post(self.config.invoke_url()).json(&body);
        if let Some(ref key) = self.config.api_key {
            call = call.header("Authorization", format!("Bearer {}", key));
        }

        let response = call.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = format!("agent runtime returned {}: {}", status.as_u16(), error_text);
            return Err(if is_retryable_status(status) {
                AgentError::Unavailable(message)
            } else {
                AgentError::Rejected(message)
            });
        }

        let parsed: InvokeAgentResponse = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let mut answer = if parsed.streaming {
            AgentResponse::streamed(parsed.output)
        } else {
            AgentResponse::text(parsed.output)
        };
        answer.metadata = parsed.metadata;
        Ok(answer)
    }

    fn kind(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_agent_identity() {
        let agent =
            HttpAgent::new(HttpAgentConfig::new("http://localhost:1"), "FCAST", "ALIAS").unwrap();
        assert_eq!(agent.agent_id(), "FCAST");
        assert_eq!(agent.alias_id(), "ALIAS");
        assert_eq!(agent.kind(), "http");
    }
}
