//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use indexmap::IndexMap;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
    /// Readiness per agent, in registration order.
    pub agents: IndexMap<String, bool>,
}

/// Health check endpoint. 503 when any agent backend reports not ready.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Health>) {
    let agents: IndexMap<String, bool> = state.orchestrator.readiness().await.into_iter().collect();
    let ready = agents.values().all(|ready| *ready);

    let (code, status) = if ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        code,
        Json(Health {
            status: status.to_string(),
            agents,
        }),
    )
}
