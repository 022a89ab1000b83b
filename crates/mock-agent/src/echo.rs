//! Echo agent - answers with the user's own input.

use agent_core::{async_trait, Agent, AgentError, AgentRequest, AgentResponse};

/// An agent that echoes the user input back.
///
/// Useful for exercising routing and persistence without a real backend.
#[derive(Debug, Clone, Default)]
pub struct EchoAgent {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoAgent {
    /// Create a new EchoAgent with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an EchoAgent that prefixes every reply.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_agent::EchoAgent;
    ///
    /// let agent = EchoAgent::with_prefix("[solar] ");
    /// // Will respond with "[solar] <original input>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl Agent for EchoAgent {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentResponse, AgentError> {
        let output = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, request.user_input),
            None => request.user_input,
        };
        Ok(AgentResponse::text(output))
    }

    fn kind(&self) -> &str {
        "echo"
    }
}
