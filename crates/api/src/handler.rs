//! The inbound operation: one event in, one `{statusCode, body}` out.

use std::sync::Arc;

use orchestrator::{Orchestrator, RouteRequest, RoutedResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// An inbound turn as callers send it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeEvent {
    pub query: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

impl InvokeEvent {
    pub fn new(
        query: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            query: Some(query.into()),
            user_id: Some(user_id.into()),
            session_id: Some(session_id.into()),
        }
    }

    fn into_request(self) -> Result<RouteRequest> {
        let query = required(self.query, "query")?;
        let user_id = required(self.user_id, "userId")?;
        let session_id = required(self.session_id, "sessionId")?;
        Ok(RouteRequest::new(query, user_id, session_id))
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::InvalidEvent(format!("missing {}", field)))
}

/// Who answered a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub agent_id: String,
    pub agent_name: String,
    pub user_input: String,
    pub session_id: String,
}

/// Success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeBody {
    pub metadata: ResponseMetadata,
    pub output: String,
    pub streaming: bool,
}

impl From<RoutedResponse> for InvokeBody {
    fn from(routed: RoutedResponse) -> Self {
        Self {
            metadata: ResponseMetadata {
                agent_id: routed.agent_id,
                agent_name: routed.agent_name,
                user_input: routed.user_input,
                session_id: routed.session_id,
            },
            output: routed.output_text,
            streaming: routed.is_streaming,
        }
    }
}

/// Status code plus a JSON-encoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvokeResponse {
    pub fn internal_error() -> Self {
        Self {
            status_code: 500,
            body: AppError::body().to_string(),
        }
    }
}

/// Route one event on a separate task.
///
/// A panic anywhere in the pipeline surfaces as [`AppError::Aborted`]
/// instead of taking the caller down.
pub async fn route_event(orchestrator: Arc<Orchestrator>, event: InvokeEvent) -> Result<InvokeBody> {
    let request = event.into_request()?;
    let span = info_span!(
        "invoke",
        request_id = %Uuid::new_v4(),
        user_id = %request.user_id,
        session_id = %request.session_id,
    );

    let routed = tokio::spawn(async move { orchestrator.route(request).await }.instrument(span))
        .await
        .map_err(|e| AppError::Aborted(e.to_string()))??;

    Ok(InvokeBody::from(routed))
}

/// The in-process entry point. Never fails: every error becomes the generic 500.
pub async fn handle(orchestrator: Arc<Orchestrator>, event: InvokeEvent) -> InvokeResponse {
    let encoded = match route_event(orchestrator, event).await {
        Ok(body) => serde_json::to_string(&body).map_err(AppError::from),
        Err(err) => Err(err),
    };

    match encoded {
        Ok(body) => InvokeResponse {
            status_code: 200,
            body,
        },
        Err(err) => {
            error!(kind = err.kind(), "Request failed: {}", err);
            InvokeResponse::internal_error()
        }
    }
}
