//! Delayed agent - wraps another agent with artificial latency.

use std::time::Duration;

use agent_core::{async_trait, Agent, AgentError, AgentRequest, AgentResponse};
use tokio::time::sleep;

/// An agent that sleeps before delegating to an inner agent.
///
/// Useful for testing invocation deadlines.
pub struct DelayedAgent<A: Agent> {
    inner: A,
    delay: Duration,
}

impl<A: Agent> DelayedAgent<A> {
    pub fn new(inner: A, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create an agent with a delay in milliseconds.
    pub fn with_millis(inner: A, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<A: Agent> Agent for DelayedAgent<A> {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentResponse, AgentError> {
        sleep(self.delay).await;
        self.inner.invoke(request).await
    }

    fn kind(&self) -> &str {
        "delayed"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }
}
