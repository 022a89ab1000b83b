//! Remote collaborators reached over HTTP.
//!
//! - [`HttpAgent`] forwards routed turns to an agent runtime's `/invoke`
//!   endpoint, one instance per registered agent id/alias pair.
//! - [`ChatCompletionModel`] implements [`ClassifierModel`] on top of any
//!   OpenAI-compatible `/v1/chat/completions` endpoint.
//!
//! Both map HTTP failures onto the transient/permanent split the router
//! retries on: 408, 429 and 5xx responses and connection failures are
//! transient, every other non-success status is not.
//!
//! # Usage
//!
//! ```rust,no_run
//! use remote_agent::{HttpAgent, HttpAgentConfig};
//!
//! fn main() -> Result<(), remote_agent::AgentError> {
//!     let config = HttpAgentConfig::from_env()?;
//!     let _solar = HttpAgent::new(config, "SOLAR123", "TSTALIASID")?;
//!     Ok(())
//! }
//! ```

mod api_types;
mod chat_model;
mod config;
mod http_agent;

pub use api_types::{HistoryTurn, InvokeAgentRequest, InvokeAgentResponse};
pub use chat_model::ChatCompletionModel;
pub use config::{ChatModelConfig, ChatModelConfigBuilder, HttpAgentConfig};
pub use http_agent::{is_retryable_status, HttpAgent};

// Re-export agent-core types for convenience
pub use agent_core::{
    async_trait, Agent, AgentError, AgentRequest, AgentResponse, ClassifierModel,
    ClassifierPrompt, ModelError,
};
