//! Mock agents and classifier models.
//!
//! This crate provides deterministic implementations of the
//! [`Agent`] and [`ClassifierModel`] traits:
//! - `EchoAgent` - Echoes the user input back, optionally prefixed
//! - `ScriptedAgent` - Fixed reply with a scripted failure plan
//! - `DelayedAgent` - Wraps another agent with artificial delay
//! - `ScriptedModel` - Classifier model returning canned raw output
//!
//! For remote agents, use the `remote-agent` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_agent::{Agent, AgentRequest, EchoAgent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_agent::AgentError> {
//!     let agent = EchoAgent::new();
//!     let response = agent.invoke(AgentRequest::new("Hello!", "u1", "s1")).await?;
//!     assert_eq!(response.output, "Hello!");
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod model;
mod scripted;

// Re-export agent-core types for convenience
pub use agent_core::{
    async_trait, Agent, AgentError, AgentRequest, AgentResponse, ClassifierModel,
    ClassifierPrompt, ModelError,
};

pub use delayed::DelayedAgent;
pub use echo::EchoAgent;
pub use model::ScriptedModel;
pub use scripted::ScriptedAgent;
