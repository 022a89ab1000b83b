//! Inbound boundary for the agent router.
//!
//! Exposes the router two ways:
//!
//! - [`handler::handle`]: in-process, `{query, userId, sessionId}` in and
//!   `{statusCode, body}` out
//! - [`app`]: an axum router serving `POST /invoke` and `GET /health`
//!
//! Both collapse every failure, panics included, into a 500 with
//! `{"error": "Internal Server Error"}`.

pub mod agents;
pub mod config;
pub mod error;
pub mod handler;
pub mod routes;
pub mod state;

use axum::Router;

pub use crate::config::{AppConfig, ConfigError, StorageBackend};
pub use crate::error::AppError;
pub use crate::handler::{handle, InvokeBody, InvokeEvent, InvokeResponse, ResponseMetadata};
pub use crate::state::AppState;

/// Build the HTTP application.
pub fn app(state: AppState) -> Router {
    routes::router().with_state(state)
}
