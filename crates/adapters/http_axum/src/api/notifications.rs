//! Notification endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use relayhub_app::ports::AutomationControl;
use relayhub_domain::delivery::DeliveryOutcome;
use relayhub_domain::notification::QueuedMessage;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for queueing a message.
#[derive(Deserialize)]
pub struct EnqueueRequest {
    pub recipient: String,
    pub body: String,
}

/// Possible responses from the enqueue endpoint.
pub enum EnqueueResponse {
    Accepted(Json<QueuedMessage>),
}

impl IntoResponse for EnqueueResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(json) => (StatusCode::ACCEPTED, json).into_response(),
        }
    }
}

/// `POST /api/notifications` — put a message on the retry queue.
pub async fn enqueue<S>(
    State(state): State<AppState<S>>,
    Json(req): Json<EnqueueRequest>,
) -> Result<EnqueueResponse, ApiError>
where
    S: AutomationControl + Send + Sync + 'static,
{
    let queued = state
        .control
        .enqueue_notification(req.recipient, req.body)
        .await?;
    Ok(EnqueueResponse::Accepted(Json(queued)))
}

/// `POST /api/notifications/test` — send the test message to the
/// configured recipient and report the outcome.
pub async fn test<S>(State(state): State<AppState<S>>) -> Result<Json<DeliveryOutcome>, ApiError>
where
    S: AutomationControl + Send + Sync + 'static,
{
    let outcome = state.control.send_test_notification().await?;
    Ok(Json(outcome))
}
