//! End-to-end routing behaviour with deterministic collaborators.

use std::sync::Arc;
use std::time::Duration;

use agent_core::{AgentDescriptor, MessagePair};
use async_trait::async_trait;
use chat_storage::{
    ConversationStore, ManualClock, MemoryStore, RetentionPolicy, StorageError, SystemClock,
};
use mock_agent::{DelayedAgent, ScriptedAgent, ScriptedModel};
use orchestrator::{
    AgentRegistry, Classifier, Orchestrator, OrchestratorConfig, OrchestratorError, RouteRequest,
    STREAMED_OUTPUT_NOTE,
};

const FORECAST: &str = "forecast";
const SOLAR: &str = "solar";
const PEAK: &str = "peak";

struct EnergyAgents {
    forecast: Arc<ScriptedAgent>,
    solar: Arc<ScriptedAgent>,
    peak: Arc<ScriptedAgent>,
}

impl EnergyAgents {
    fn replying() -> Self {
        Self {
            forecast: Arc::new(ScriptedAgent::replying("Expect 42 kWh tomorrow.")),
            solar: Arc::new(ScriptedAgent::replying("Clean the panels monthly.")),
            peak: Arc::new(ScriptedAgent::replying("Shift laundry to off-peak hours.")),
        }
    }

    fn with_solar(solar: ScriptedAgent) -> Self {
        Self {
            solar: Arc::new(solar),
            ..Self::replying()
        }
    }

    fn registry(&self) -> Arc<AgentRegistry> {
        let registry = AgentRegistry::builder()
            .register(
                AgentDescriptor::new(
                    FORECAST,
                    "Energy Forecast Agent",
                    "Energy consumption analysis and forecasting.",
                ),
                self.forecast.clone(),
            )
            .unwrap()
            .register(
                AgentDescriptor::new(SOLAR, "Solar Panel Agent", "Solar panel inquiries and issues."),
                self.solar.clone(),
            )
            .unwrap()
            .register(
                AgentDescriptor::new(
                    PEAK,
                    "Peak Load Manager Agent",
                    "Peak load management and energy optimization.",
                ),
                self.peak.clone(),
            )
            .unwrap()
            .build()
            .unwrap();
        Arc::new(registry)
    }
}

fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig::builder()
        .retry_delays(Duration::ZERO, Duration::ZERO)
        .build()
        .unwrap()
}

fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(
        RetentionPolicy::default(),
        Arc::new(SystemClock),
    ))
}

fn build(
    config: OrchestratorConfig,
    agents: &EnergyAgents,
    model: Arc<ScriptedModel>,
    store: Arc<dyn ConversationStore>,
) -> Orchestrator {
    let classifier = Classifier::configured(model, "Pick one agent.", &config);
    Orchestrator::new(config, agents.registry(), classifier, store)
}

/// Delegates reads, optionally fails reads or writes.
struct FlakyStore {
    inner: MemoryStore,
    fail_reads: bool,
    fail_writes: bool,
}

impl FlakyStore {
    fn failing_writes() -> Self {
        Self {
            inner: MemoryStore::new(RetentionPolicy::default(), Arc::new(SystemClock)),
            fail_reads: false,
            fail_writes: true,
        }
    }

    fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            fail_writes: false,
            ..Self::failing_writes()
        }
    }

    fn check_reads(&self) -> chat_storage::Result<()> {
        if self.fail_reads {
            return Err(StorageError::Unavailable("read refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for FlakyStore {
    async fn load(
        &self,
        user_id: &str,
        session_id: &str,
        agent_id: &str,
    ) -> chat_storage::Result<Vec<MessagePair>> {
        self.check_reads()?;
        self.inner.load(user_id, session_id, agent_id).await
    }

    async fn load_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> chat_storage::Result<Vec<MessagePair>> {
        self.check_reads()?;
        self.inner.load_session(user_id, session_id).await
    }

    async fn append(
        &self,
        user_id: &str,
        session_id: &str,
        agent_id: &str,
        pair: MessagePair,
    ) -> chat_storage::Result<()> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("write refused".to_string()));
        }
        self.inner.append(user_id, session_id, agent_id, pair).await
    }

    async fn purge_expired(&self) -> chat_storage::Result<u64> {
        self.inner.purge_expired().await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[tokio::test]
async fn test_routes_to_solar_and_persists_one_pair() {
    let agents = EnergyAgents::replying();
    let store = memory_store();
    let orchestrator = build(
        fast_config(),
        &agents,
        Arc::new(ScriptedModel::selecting(SOLAR)),
        store.clone(),
    );

    let response = orchestrator
        .route(RouteRequest::new("My panels produce less than usual", "u1", "s1"))
        .await
        .unwrap();

    assert_eq!(response.agent_id, SOLAR);
    assert_eq!(response.agent_name, "Solar Panel Agent");
    assert_eq!(response.output_text, "Clean the panels monthly.");
    assert_eq!(response.user_input, "My panels produce less than usual");
    assert_eq!(response.session_id, "s1");
    assert!(!response.is_streaming);
    assert!(!response.used_fallback);

    let history = store.load("u1", "s1", SOLAR).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user_text(), "My panels produce less than usual");
    assert_eq!(history[0].agent_text(), "Clean the panels monthly.");
    assert!(store.load("u1", "s1", FORECAST).await.unwrap().is_empty());

    assert_eq!(agents.solar.attempts(), 1);
    assert_eq!(agents.forecast.attempts(), 0);
    assert_eq!(agents.peak.attempts(), 0);
}

#[tokio::test]
async fn test_unknown_agent_falls_back_to_default() {
    let agents = EnergyAgents::replying();
    let orchestrator = build(
        fast_config(),
        &agents,
        Arc::new(ScriptedModel::selecting("wind")),
        memory_store(),
    );

    let response = orchestrator
        .route(RouteRequest::new("Tell me about wind turbines", "u1", "s1"))
        .await
        .unwrap();

    assert_eq!(response.agent_id, FORECAST);
    assert!(response.used_fallback);
    assert_eq!(agents.forecast.attempts(), 1);
}

#[tokio::test]
async fn test_unparseable_output_falls_back_to_default() {
    let agents = EnergyAgents::replying();
    let orchestrator = build(
        fast_config(),
        &agents,
        Arc::new(ScriptedModel::answering("I cannot decide, sorry.")),
        memory_store(),
    );

    let response = orchestrator
        .route(RouteRequest::new("hmm", "u1", "s1"))
        .await
        .unwrap();

    assert_eq!(response.agent_name, "Energy Forecast Agent");
    assert!(response.used_fallback);
}

#[tokio::test]
async fn test_unknown_agent_without_fallback_fails() {
    let agents = EnergyAgents::replying();
    let store = memory_store();
    let config = OrchestratorConfig::builder()
        .use_default_agent_if_none_identified(false)
        .retry_delays(Duration::ZERO, Duration::ZERO)
        .build()
        .unwrap();
    let orchestrator = build(
        config,
        &agents,
        Arc::new(ScriptedModel::selecting("wind")),
        store.clone(),
    );

    let err = orchestrator
        .route(RouteRequest::new("Tell me about wind turbines", "u1", "s1"))
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::NoAgentIdentified));
    assert_eq!(agents.forecast.attempts(), 0);
    assert!(store.load_session("u1", "s1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_classifier_recovers_within_retry_budget() {
    let agents = EnergyAgents::replying();
    let model = Arc::new(ScriptedModel::selecting(PEAK).failing_transiently(2));
    let orchestrator = build(fast_config(), &agents, model.clone(), memory_store());

    let response = orchestrator
        .route(RouteRequest::new("When should I run the dryer?", "u1", "s1"))
        .await
        .unwrap();

    assert_eq!(response.agent_id, PEAK);
    assert_eq!(model.attempts(), 3);
}

#[tokio::test]
async fn test_classifier_gives_up_after_max_retries() {
    let agents = EnergyAgents::replying();
    let model = Arc::new(ScriptedModel::selecting(PEAK).always_unavailable());
    let orchestrator = build(fast_config(), &agents, model.clone(), memory_store());

    let err = orchestrator
        .route(RouteRequest::new("When should I run the dryer?", "u1", "s1"))
        .await
        .unwrap_err();

    match err {
        OrchestratorError::ClassificationFailed { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("Expected ClassificationFailed, got {:?}", other),
    }
    assert_eq!(model.attempts(), 3);
    assert_eq!(agents.peak.attempts(), 0);
}

#[tokio::test]
async fn test_agent_recovers_within_retry_budget() {
    let agents = EnergyAgents::with_solar(
        ScriptedAgent::replying("Panels are fine.").failing_transiently(2),
    );
    let orchestrator = build(
        fast_config(),
        &agents,
        Arc::new(ScriptedModel::selecting(SOLAR)),
        memory_store(),
    );

    let response = orchestrator
        .route(RouteRequest::new("Are my panels ok?", "u1", "s1"))
        .await
        .unwrap();

    assert_eq!(response.output_text, "Panels are fine.");
    assert_eq!(agents.solar.attempts(), 3);
}

#[tokio::test]
async fn test_agent_gives_up_after_max_retries() {
    let agents = EnergyAgents::with_solar(ScriptedAgent::replying("never").always_unavailable());
    let store = memory_store();
    let orchestrator = build(
        fast_config(),
        &agents,
        Arc::new(ScriptedModel::selecting(SOLAR)),
        store.clone(),
    );

    let err = orchestrator
        .route(RouteRequest::new("Are my panels ok?", "u1", "s1"))
        .await
        .unwrap_err();

    match err {
        OrchestratorError::AgentInvocationFailed {
            agent_id, attempts, ..
        } => {
            assert_eq!(agent_id, SOLAR);
            assert_eq!(attempts, 3);
        }
        other => panic!("Expected AgentInvocationFailed, got {:?}", other),
    }
    assert_eq!(agents.solar.attempts(), 3);
    assert!(store.load("u1", "s1", SOLAR).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_permanent_agent_error_is_not_retried() {
    let agents = EnergyAgents::with_solar(ScriptedAgent::replying("never").rejecting());
    let orchestrator = build(
        fast_config(),
        &agents,
        Arc::new(ScriptedModel::selecting(SOLAR)),
        memory_store(),
    );

    let err = orchestrator
        .route(RouteRequest::new("Are my panels ok?", "u1", "s1"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::AgentInvocationFailed { attempts: 1, .. }
    ));
    assert_eq!(agents.solar.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_agent_deadline() {
    let agents = EnergyAgents::replying();
    let slow = DelayedAgent::new(
        ScriptedAgent::replying("too late"),
        Duration::from_secs(5),
    );
    let registry = AgentRegistry::builder()
        .register(
            AgentDescriptor::new(SOLAR, "Solar Panel Agent", "Solar panel inquiries."),
            Arc::new(slow),
        )
        .unwrap()
        .register(
            AgentDescriptor::new(FORECAST, "Energy Forecast Agent", "Forecasts."),
            agents.forecast.clone(),
        )
        .unwrap()
        .build()
        .unwrap();
    let config = OrchestratorConfig::builder()
        .agent_timeout(Duration::from_millis(100))
        .retry_delays(Duration::ZERO, Duration::ZERO)
        .build()
        .unwrap();
    let classifier = Classifier::configured(
        Arc::new(ScriptedModel::selecting(SOLAR)),
        "Pick one agent.",
        &config,
    );
    let orchestrator = Orchestrator::new(config, Arc::new(registry), classifier, memory_store());

    let err = orchestrator
        .route(RouteRequest::new("Are my panels ok?", "u1", "s1"))
        .await
        .unwrap_err();

    match err {
        OrchestratorError::AgentInvocationTimeout { agent_id, timeout } => {
            assert_eq!(agent_id, SOLAR);
            assert_eq!(timeout, Duration::from_millis(100));
        }
        other => panic!("Expected AgentInvocationTimeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_append_still_returns_answer() {
    let agents = EnergyAgents::replying();
    let orchestrator = build(
        fast_config(),
        &agents,
        Arc::new(ScriptedModel::selecting(SOLAR)),
        Arc::new(FlakyStore::failing_writes()),
    );

    let response = orchestrator
        .route(RouteRequest::new("Are my panels ok?", "u1", "s1"))
        .await
        .unwrap();

    assert_eq!(response.output_text, "Clean the panels monthly.");
}

#[tokio::test]
async fn test_failed_context_read_fails_fast() {
    let agents = EnergyAgents::replying();
    let model = Arc::new(ScriptedModel::selecting(SOLAR));
    let orchestrator = build(
        fast_config(),
        &agents,
        model.clone(),
        Arc::new(FlakyStore::failing_reads()),
    );

    let err = orchestrator
        .route(RouteRequest::new("Are my panels ok?", "u1", "s1"))
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::StorageUnavailable(_)));
    assert_eq!(model.attempts(), 0);
    assert_eq!(agents.solar.attempts(), 0);
}

#[tokio::test]
async fn test_streamed_answer_is_noted_and_persisted() {
    let agents =
        EnergyAgents::with_solar(ScriptedAgent::replying("Long streamed explanation").streaming());
    let store = memory_store();
    let orchestrator = build(
        fast_config(),
        &agents,
        Arc::new(ScriptedModel::selecting(SOLAR)),
        store.clone(),
    );

    let response = orchestrator
        .route(RouteRequest::new("Explain inverters", "u1", "s1"))
        .await
        .unwrap();

    assert!(response.is_streaming);
    assert_eq!(response.output_text, STREAMED_OUTPUT_NOTE);

    let history = store.load("u1", "s1", SOLAR).await.unwrap();
    assert_eq!(history[0].agent_text(), "Long streamed explanation");
}

#[tokio::test]
async fn test_follow_up_sees_previous_turn() {
    let agents = EnergyAgents::replying();
    let model = Arc::new(ScriptedModel::selecting(SOLAR));
    let orchestrator = build(fast_config(), &agents, model.clone(), memory_store());

    orchestrator
        .route(RouteRequest::new("How do I clean panels?", "u1", "s1"))
        .await
        .unwrap();
    orchestrator
        .route(RouteRequest::new("And how often?", "u1", "s1"))
        .await
        .unwrap();

    let prompt = model.last_prompt().await.unwrap();
    assert!(prompt.user.contains("user: How do I clean panels?"));
    assert!(prompt.user.contains("solar: Clean the panels monthly."));

    let seen = agents.solar.last_request().await.unwrap();
    assert_eq!(seen.user_input, "And how often?");
    assert_eq!(seen.history.len(), 1);
    assert_eq!(seen.history[0].user_text(), "How do I clean panels?");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let agents = EnergyAgents::replying();
    let store = memory_store();
    let orchestrator = build(
        fast_config(),
        &agents,
        Arc::new(ScriptedModel::selecting(SOLAR)),
        store.clone(),
    );

    orchestrator
        .route(RouteRequest::new("first", "u1", "s1"))
        .await
        .unwrap();
    orchestrator
        .route(RouteRequest::new("second", "u2", "s1"))
        .await
        .unwrap();

    assert_eq!(store.load("u1", "s1", SOLAR).await.unwrap().len(), 1);
    assert_eq!(store.load("u2", "s1", SOLAR).await.unwrap().len(), 1);
    assert!(store.load("u1", "s2", SOLAR).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_retention_cap_applies_across_turns() {
    let agents = EnergyAgents::replying();
    let config = OrchestratorConfig::builder()
        .max_message_pairs_per_agent(2)
        .retry_delays(Duration::ZERO, Duration::ZERO)
        .build()
        .unwrap();
    let store = Arc::new(MemoryStore::new(config.retention(), Arc::new(SystemClock)));
    let orchestrator = build(
        config,
        &agents,
        Arc::new(ScriptedModel::selecting(SOLAR)),
        store.clone(),
    );

    for turn in ["one", "two", "three"] {
        orchestrator
            .route(RouteRequest::new(turn, "u1", "s1"))
            .await
            .unwrap();
    }

    let history = store.load("u1", "s1", SOLAR).await.unwrap();
    let kept: Vec<&str> = history.iter().map(MessagePair::user_text).collect();
    assert_eq!(kept, ["two", "three"]);
}

#[tokio::test]
async fn test_expired_session_starts_fresh() {
    let agents = EnergyAgents::replying();
    let clock = Arc::new(ManualClock::now_frozen());
    let config = fast_config();
    let store = Arc::new(MemoryStore::new(config.retention(), clock.clone()));
    let classifier = Classifier::configured(
        Arc::new(ScriptedModel::selecting(SOLAR)),
        "Pick one agent.",
        &config,
    );
    let orchestrator = Orchestrator::new(config, agents.registry(), classifier, store.clone())
        .with_clock(clock.clone());

    orchestrator
        .route(RouteRequest::new("before", "u1", "s1"))
        .await
        .unwrap();
    clock.advance(Duration::from_secs(3601));
    orchestrator
        .route(RouteRequest::new("after", "u1", "s1"))
        .await
        .unwrap();

    let seen = agents.solar.last_request().await.unwrap();
    assert!(seen.history.is_empty());

    let history = store.load("u1", "s1", SOLAR).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user_text(), "after");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_turns_in_one_session_are_all_kept() {
    let agents = EnergyAgents::replying();
    let store = memory_store();
    let orchestrator = Arc::new(build(
        fast_config(),
        &agents,
        Arc::new(ScriptedModel::selecting(SOLAR)),
        store.clone(),
    ));

    let turns = (0..5).map(|i| {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .route(RouteRequest::new(format!("turn {}", i), "u1", "s1"))
                .await
        })
    });
    for result in futures::future::join_all(turns).await {
        result.unwrap().unwrap();
    }

    assert_eq!(store.load("u1", "s1", SOLAR).await.unwrap().len(), 5);
}
