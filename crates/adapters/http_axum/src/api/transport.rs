//! Messaging transport supervision endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use relayhub_app::maintenance::MaintenanceReport;
use relayhub_app::ports::{AutomationControl, TransportStatus};

use crate::state::AppState;

/// `GET /api/transport/status` — connection state, queue length and budget.
pub async fn status<S>(State(state): State<AppState<S>>) -> Json<TransportStatus>
where
    S: AutomationControl + Send + Sync + 'static,
{
    Json(state.control.supervisor_status().await)
}

/// `POST /api/transport/restart` — tear the session down and reconnect with
/// a fresh budget. The reconnection happens in the background.
pub async fn restart<S>(State(state): State<AppState<S>>) -> StatusCode
where
    S: AutomationControl + Send + Sync + 'static,
{
    state.control.restart_transport().await;
    StatusCode::ACCEPTED
}

/// `POST /api/transport/refresh` — resync the connection state and flush
/// the retry queue when possible.
pub async fn refresh<S>(State(state): State<AppState<S>>) -> Json<MaintenanceReport>
where
    S: AutomationControl + Send + Sync + 'static,
{
    Json(state.control.refresh_transport().await)
}
