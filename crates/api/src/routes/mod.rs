//! HTTP routes.

pub mod health;
pub mod invoke;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invoke", post(invoke::invoke))
        .route("/health", get(health::health))
}
