//! Per-request routing pipeline.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_core::{AgentError, AgentRequest, AgentResponse, MessagePair, ModelError};
use chat_storage::{Clock, ConversationStore, SystemClock};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

use crate::classifier::{ClassificationResult, Classifier};
use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::registry::{AgentRegistry, RegisteredAgent};
use crate::retry::{retry_transient, RetryError};

/// Returned as `output_text` when the agent streamed its answer to the
/// client out-of-band.
pub const STREAMED_OUTPUT_NOTE: &str = "The response was streamed to the client.";

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    ContextLoaded,
    Classified,
    AgentResolved,
    AgentInvoked,
    Persisted,
    Complete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::ContextLoaded => "context_loaded",
            Stage::Classified => "classified",
            Stage::AgentResolved => "agent_resolved",
            Stage::AgentInvoked => "agent_invoked",
            Stage::Persisted => "persisted",
            Stage::Complete => "complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub user_input: String,
    pub user_id: String,
    pub session_id: String,
}

impl RouteRequest {
    pub fn new(
        user_input: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// The normalized answer for one routed turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutedResponse {
    pub agent_id: String,
    pub agent_name: String,
    pub session_id: String,
    pub user_input: String,
    /// The agent's text, or [`STREAMED_OUTPUT_NOTE`] for streamed answers.
    pub output_text: String,
    pub is_streaming: bool,
    /// The classifier picked nothing usable and the default agent answered.
    pub used_fallback: bool,
}

/// Why a single invocation attempt failed.
#[derive(Debug)]
enum AttemptFailure {
    Agent(AgentError),
    Deadline(Duration),
}

impl AttemptFailure {
    fn is_transient(&self) -> bool {
        match self {
            AttemptFailure::Agent(err) => err.is_transient(),
            AttemptFailure::Deadline(_) => false,
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Agent(err) => write!(f, "{}", err),
            AttemptFailure::Deadline(limit) => write!(f, "deadline of {:?} elapsed", limit),
        }
    }
}

/// Tracks stage transitions and, when enabled, their durations.
struct StageTracker {
    stage: Stage,
    record_timings: bool,
    started: Instant,
    last: Instant,
    timings: Vec<(Stage, Duration)>,
}

impl StageTracker {
    fn new(record_timings: bool) -> Self {
        let now = Instant::now();
        Self {
            stage: Stage::Received,
            record_timings,
            started: now,
            last: now,
            timings: Vec::new(),
        }
    }

    fn advance(&mut self, next: Stage) {
        trace!(from = %self.stage, to = %next, "STAGE_TRANSITION");
        if self.record_timings {
            let now = Instant::now();
            self.timings.push((next, now - self.last));
            self.last = now;
        }
        self.stage = next;
    }

    /// Log and hand back a failure raised at the current stage.
    fn fail(&self, err: OrchestratorError) -> OrchestratorError {
        error!(stage = %self.stage, kind = err.kind(), error = %err, "Request failed");
        err
    }

    fn report(&self) {
        if !self.record_timings {
            return;
        }
        let stages = self
            .timings
            .iter()
            .map(|(stage, took)| format!("{}={}ms", stage, took.as_millis()))
            .collect::<Vec<_>>()
            .join(" ");
        info!(
            total_ms = self.started.elapsed().as_millis() as u64,
            stages = %stages,
            "EXECUTION_TIMES"
        );
    }
}

/// Routes one utterance to one agent and keeps the conversation history.
///
/// The orchestrator holds no locks of its own; the only shared state is the
/// conversation store. Safe to share across tasks behind an `Arc`.
pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: Arc<AgentRegistry>,
    classifier: Classifier,
    store: Arc<dyn ConversationStore>,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        registry: Arc<AgentRegistry>,
        classifier: Classifier,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        info!(
            agents = registry.len(),
            store = store.name(),
            classifier_model = classifier.model_name(),
            max_retries = config.max_retries,
            fallback = config.use_default_agent_if_none_identified,
            "Orchestrator initialized"
        );
        Self {
            config,
            registry,
            classifier,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a specific clock for message timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Readiness of every registered backend, in registration order.
    pub async fn readiness(&self) -> Vec<(String, bool)> {
        let mut states = Vec::with_capacity(self.registry.len());
        for agent in self.registry.iter() {
            states.push((agent.id().to_string(), agent.backend().is_ready().await));
        }
        states
    }

    /// Route one turn end-to-end.
    ///
    /// 1. Load the session history (classifier context)
    /// 2. Classify, retrying transient model failures
    /// 3. Resolve the agent, falling back to the default agent if enabled
    /// 4. Load the agent's own history and invoke it, retrying transient failures
    /// 5. Persist the exchange (failures are logged, not returned)
    pub async fn route(&self, request: RouteRequest) -> Result<RoutedResponse, OrchestratorError> {
        let mut stages = StageTracker::new(self.config.logging.execution_times);
        info!(
            user_id = %request.user_id,
            session_id = %request.session_id,
            "Routing request"
        );

        // 1. Shared session log for the classifier
        let session_history = self
            .store
            .load_session(&request.user_id, &request.session_id)
            .await
            .map_err(|e| stages.fail(e.into()))?;
        stages.advance(Stage::ContextLoaded);
        debug!(pairs = session_history.len(), "Session history loaded");

        // 2. Classification
        let mut classification = self
            .classify_with_retry(&request, &session_history)
            .await
            .map_err(|e| stages.fail(e))?;
        stages.advance(Stage::Classified);

        // 3. Resolution
        let target = self
            .resolve(&mut classification)
            .map_err(|e| stages.fail(e))?;
        stages.advance(Stage::AgentResolved);
        info!(
            agent_id = %target.id(),
            confidence = ?classification.confidence,
            used_fallback = classification.used_fallback,
            "Agent resolved"
        );

        // 4. Invocation with the agent's own bounded history
        let agent_history = self
            .store
            .load(&request.user_id, &request.session_id, target.id())
            .await
            .map_err(|e| stages.fail(e.into()))?;
        let asked_at = self.clock.now();
        let response = self
            .invoke_with_retry(target, &request, agent_history)
            .await
            .map_err(|e| stages.fail(e))?;
        stages.advance(Stage::AgentInvoked);

        // 5. Persistence is best effort once the agent has answered
        let pair = MessagePair::exchange(
            target.id(),
            request.user_input.as_str(),
            asked_at,
            response.output.as_str(),
            self.clock.now(),
        );
        if let Err(e) = self
            .store
            .append(&request.user_id, &request.session_id, target.id(), pair)
            .await
        {
            warn!(
                agent_id = %target.id(),
                session_id = %request.session_id,
                error = %e,
                "Failed to persist exchange, returning answer anyway"
            );
        }
        stages.advance(Stage::Persisted);

        let output_text = if response.streaming {
            STREAMED_OUTPUT_NOTE.to_string()
        } else {
            response.output
        };

        stages.advance(Stage::Complete);
        stages.report();

        Ok(RoutedResponse {
            agent_id: target.id().to_string(),
            agent_name: target.name().to_string(),
            session_id: request.session_id,
            user_input: request.user_input,
            output_text,
            is_streaming: response.streaming,
            used_fallback: classification.used_fallback,
        })
    }

    async fn classify_with_retry(
        &self,
        request: &RouteRequest,
        history: &[MessagePair],
    ) -> Result<ClassificationResult, OrchestratorError> {
        let policy = self.config.retry_policy();
        retry_transient(&policy, "classify", ModelError::is_transient, |_| {
            self.classifier
                .classify(&request.user_input, history, &self.registry)
        })
        .await
        .map(|(result, _)| result)
        .map_err(|RetryError { attempts, error }| OrchestratorError::ClassificationFailed {
            attempts,
            source: error,
        })
    }

    fn resolve(
        &self,
        classification: &mut ClassificationResult,
    ) -> Result<&RegisteredAgent, OrchestratorError> {
        if let Some(agent) = classification
            .selected_agent_id
            .as_deref()
            .and_then(|id| self.registry.find(id))
        {
            return Ok(agent);
        }

        if !self.config.use_default_agent_if_none_identified {
            return Err(OrchestratorError::NoAgentIdentified);
        }

        let fallback = self.registry.default_agent();
        info!(
            agent_id = %fallback.id(),
            raw_output = %classification.raw_output,
            "No agent identified, using default agent"
        );
        classification.used_fallback = true;
        Ok(fallback)
    }

    async fn invoke_with_retry(
        &self,
        target: &RegisteredAgent,
        request: &RouteRequest,
        history: Vec<MessagePair>,
    ) -> Result<AgentResponse, OrchestratorError> {
        let policy = self.config.retry_policy();
        let deadline = self.config.agent_timeout;
        let agent_request = AgentRequest::new(
            request.user_input.as_str(),
            request.user_id.as_str(),
            request.session_id.as_str(),
        )
        .with_history(history);

        if self.config.logging.agent_chat {
            info!(agent_id = %target.id(), input = %request.user_input, "AGENT_INPUT");
        }

        let outcome = retry_transient(&policy, "invoke_agent", AttemptFailure::is_transient, |attempt| {
            let backend = Arc::clone(target.backend());
            let call = agent_request.clone();
            async move {
                trace!(attempt, backend = backend.kind(), "Invoking agent");
                match deadline {
                    Some(limit) => match timeout(limit, backend.invoke(call)).await {
                        Ok(result) => result.map_err(AttemptFailure::Agent),
                        Err(_) => Err(AttemptFailure::Deadline(limit)),
                    },
                    None => backend.invoke(call).await.map_err(AttemptFailure::Agent),
                }
            }
        })
        .await;

        match outcome {
            Ok((response, attempts)) => {
                if self.config.logging.agent_chat {
                    info!(
                        agent_id = %target.id(),
                        attempts,
                        streaming = response.streaming,
                        output = %response.output,
                        "AGENT_OUTPUT"
                    );
                } else {
                    debug!(agent_id = %target.id(), attempts, "Agent answered");
                }
                Ok(response)
            }
            Err(RetryError {
                error: AttemptFailure::Deadline(limit),
                ..
            }) => Err(OrchestratorError::AgentInvocationTimeout {
                agent_id: target.id().to_string(),
                timeout: limit,
            }),
            Err(RetryError {
                attempts,
                error: AttemptFailure::Agent(source),
            }) => Err(OrchestratorError::AgentInvocationFailed {
                agent_id: target.id().to_string(),
                attempts,
                source,
            }),
        }
    }
}
