//! Request router for a set of specialized agents.
//!
//! This crate provides the [`Orchestrator`] type which picks one agent per
//! utterance with a classifier model, invokes it, and keeps per-session
//! conversation history.
//!
//! # Features
//!
//! - Classifies each utterance against the registered agent catalogue
//! - Falls back to the first registered agent when nothing matches (optional)
//! - Retries transient classifier and agent failures with jittered backoff
//! - Optional per-attempt agent deadline
//! - Persists every exchange; a failed write never fails the request
//!
//! # Architecture
//!
//! ```text
//! RouteRequest {user_input, user_id, session_id}
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Load session history            (ConversationStore)     │
//! │         ↓                                                   │
//! │  2. Classify utterance              (Classifier, retried)   │
//! │         ↓                                                   │
//! │  3. Resolve agent or default        (AgentRegistry)         │
//! │         ↓                                                   │
//! │  4. Load agent history, invoke      (Agent, retried)        │
//! │         ↓                                                   │
//! │  5. Append exchange                 (best effort)           │
//! └─────────────────────────────────────────────────────────────┘
//!          ↓
//! RoutedResponse {agent_id, agent_name, output_text, ...}
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use agent_core::AgentDescriptor;
//! use chat_storage::{MemoryStore, SystemClock};
//! use mock_agent::{EchoAgent, ScriptedModel};
//! use orchestrator::{AgentRegistry, Classifier, Orchestrator, OrchestratorConfig, RouteRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OrchestratorConfig::default();
//!     let registry = AgentRegistry::builder()
//!         .register(
//!             AgentDescriptor::new("solar", "Solar Panel Agent", "Solar panel questions"),
//!             Arc::new(EchoAgent::new()),
//!         )?
//!         .build()?;
//!     let classifier = Classifier::configured(
//!         Arc::new(ScriptedModel::selecting("solar")),
//!         orchestrator::DEFAULT_CLASSIFIER_SYSTEM_PROMPT,
//!         &config,
//!     );
//!     let store = Arc::new(MemoryStore::new(config.retention(), Arc::new(SystemClock)));
//!
//!     let orchestrator = Orchestrator::new(config, Arc::new(registry), classifier, store);
//!     let response = orchestrator
//!         .route(RouteRequest::new("How are my panels doing?", "u1", "s1"))
//!         .await?;
//!
//!     assert_eq!(response.agent_name, "Solar Panel Agent");
//!     Ok(())
//! }
//! ```

mod classifier;
mod config;
mod error;
mod orchestrator;
mod registry;
mod retry;

pub use classifier::{
    load_classifier_prompt, ClassificationResult, Classifier, DEFAULT_CLASSIFIER_PROMPT_FILE,
    DEFAULT_CLASSIFIER_SYSTEM_PROMPT,
};
pub use config::{LogToggles, OrchestratorConfig, OrchestratorConfigBuilder};
pub use error::{ConfigError, OrchestratorError, RegistryError};
pub use orchestrator::{Orchestrator, RouteRequest, RoutedResponse, Stage, STREAMED_OUTPUT_NOTE};
pub use registry::{AgentRegistry, AgentRegistryBuilder, RegisteredAgent};
pub use retry::{retry_transient, RetryError, RetryPolicy};

// Re-export commonly used types from dependencies
pub use agent_core::{Agent, AgentDescriptor, ClassifierModel};
pub use chat_storage::ConversationStore;
