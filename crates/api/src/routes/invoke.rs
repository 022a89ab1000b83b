//! `POST /invoke`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::error::{AppError, Result};
use crate::handler::{self, InvokeBody, InvokeEvent};
use crate::state::AppState;

/// Route one turn. Malformed bodies get the same generic 500 as any failure.
pub async fn invoke(
    State(state): State<AppState>,
    event: std::result::Result<Json<InvokeEvent>, JsonRejection>,
) -> Result<Json<InvokeBody>> {
    let Json(event) = event.map_err(|e| AppError::InvalidEvent(e.body_text()))?;
    let body = handler::route_event(state.orchestrator, event).await?;
    Ok(Json(body))
}
