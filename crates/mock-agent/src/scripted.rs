//! Scripted agent - fixed reply with a configurable failure plan.

use std::sync::atomic::{AtomicUsize, Ordering};

use agent_core::{async_trait, Agent, AgentError, AgentRequest, AgentResponse};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailurePlan {
    /// Fail transiently for the first `n` attempts, then succeed.
    TransientFirst(usize),
    /// Fail transiently on every attempt.
    AlwaysTransient,
    /// Reject every attempt with a non-retryable error.
    Reject,
}

/// An agent that answers with a fixed reply after a scripted number of failures.
///
/// Every call counts as one attempt, so tests can assert on retry bounds.
#[derive(Debug)]
pub struct ScriptedAgent {
    reply: String,
    streaming: bool,
    plan: FailurePlan,
    attempts: AtomicUsize,
    last_request: Mutex<Option<AgentRequest>>,
}

impl ScriptedAgent {
    /// An agent that always answers `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            streaming: false,
            plan: FailurePlan::TransientFirst(0),
            attempts: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Fail with [`AgentError::Unavailable`] for the first `failures` attempts.
    pub fn failing_transiently(mut self, failures: usize) -> Self {
        self.plan = FailurePlan::TransientFirst(failures);
        self
    }

    /// Fail with [`AgentError::Unavailable`] on every attempt.
    pub fn always_unavailable(mut self) -> Self {
        self.plan = FailurePlan::AlwaysTransient;
        self
    }

    /// Fail with [`AgentError::Rejected`] on every attempt.
    pub fn rejecting(mut self) -> Self {
        self.plan = FailurePlan::Reject;
        self
    }

    /// Report the reply as streamed.
    pub fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    /// Number of times `invoke` has been called.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The request seen by the most recent call.
    pub async fn last_request(&self) -> Option<AgentRequest> {
        self.last_request.lock().await.clone()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentResponse, AgentError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_request.lock().await = Some(request);

        match self.plan {
            FailurePlan::TransientFirst(failures) if attempt <= failures => Err(
                AgentError::Unavailable(format!("scripted failure {} of {}", attempt, failures)),
            ),
            FailurePlan::AlwaysTransient => Err(AgentError::Unavailable(format!(
                "scripted failure on attempt {}",
                attempt
            ))),
            FailurePlan::Reject => Err(AgentError::Rejected("scripted rejection".to_string())),
            FailurePlan::TransientFirst(_) if self.streaming => {
                Ok(AgentResponse::streamed(self.reply.clone()))
            }
            FailurePlan::TransientFirst(_) => Ok(AgentResponse::text(self.reply.clone())),
        }
    }

    fn kind(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AgentRequest {
        AgentRequest::new("forecast please", "u1", "s1")
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let agent = ScriptedAgent::replying("sunny").failing_transiently(2);

        assert!(agent.invoke(request()).await.unwrap_err().is_transient());
        assert!(agent.invoke(request()).await.unwrap_err().is_transient());
        assert_eq!(agent.invoke(request()).await.unwrap().output, "sunny");
        assert_eq!(agent.attempts(), 3);
    }

    #[tokio::test]
    async fn test_rejecting_is_permanent() {
        let agent = ScriptedAgent::replying("never").rejecting();
        let err = agent.invoke(request()).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_records_last_request() {
        let agent = ScriptedAgent::replying("ok").streaming();
        let response = agent.invoke(request()).await.unwrap();

        assert!(response.streaming);
        let seen = agent.last_request().await.unwrap();
        assert_eq!(seen.user_input, "forecast please");
    }
}
