//! Core traits and types for agent routing.
//!
//! This crate provides the shared interface between the router and the
//! collaborators it drives. It defines:
//!
//! - [`Agent`] - The capability every backend agent implements
//! - [`ClassifierModel`] - The raw model call behind classification
//! - [`MessagePair`] / [`ConversationMessage`] - Persisted conversation turns
//! - [`AgentError`] / [`ModelError`] - Error types, tagged transient or permanent
//!
//! # Example
//!
//! ```rust
//! use agent_core::{async_trait, Agent, AgentError, AgentRequest, AgentResponse};
//!
//! struct Greeter;
//!
//! #[async_trait]
//! impl Agent for Greeter {
//!     async fn invoke(&self, request: AgentRequest) -> Result<AgentResponse, AgentError> {
//!         Ok(AgentResponse::text(format!("Hello, {}!", request.user_id)))
//!     }
//!
//!     fn kind(&self) -> &str {
//!         "greeter"
//!     }
//! }
//! ```

mod agent;
mod error;
mod message;
mod model;
mod prompt;

pub use agent::{Agent, AgentDescriptor, AgentRequest, AgentResponse};
pub use error::{AgentError, ModelError};
pub use message::{ConversationMessage, MessagePair, Role};
pub use model::{ClassifierModel, ClassifierPrompt};
pub use prompt::{hash_prompt, truncate_chars};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
