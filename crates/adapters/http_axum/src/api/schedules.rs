//! JSON REST handlers for relay schedules.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use relayhub_app::ports::AutomationControl;
use relayhub_domain::error::HubError;
use relayhub_domain::id::RelayId;
use relayhub_domain::schedule::Schedule;
use relayhub_domain::time::TimeOfDay;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating or replacing the schedule of a relay.
#[derive(Deserialize)]
pub struct UpsertScheduleRequest {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub is_active: Option<bool>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Schedule>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the upsert endpoint.
pub enum UpsertResponse {
    Ok(Json<Schedule>),
}

impl IntoResponse for UpsertResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

fn parse_relay_id(raw: &str) -> Result<RelayId, ApiError> {
    RelayId::from_str(raw).map_err(|err| ApiError::from(HubError::from(err)))
}

/// `GET /api/schedules` — list every schedule, active or not.
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<ListResponse, ApiError>
where
    S: AutomationControl + Send + Sync + 'static,
{
    let schedules = state.control.list_schedules().await?;
    Ok(ListResponse::Ok(Json(schedules)))
}

/// `PUT /api/schedules/{relay_id}` — create or replace the schedule of a relay.
pub async fn upsert<S>(
    State(state): State<AppState<S>>,
    Path(relay_id): Path<String>,
    Json(req): Json<UpsertScheduleRequest>,
) -> Result<UpsertResponse, ApiError>
where
    S: AutomationControl + Send + Sync + 'static,
{
    let relay_id = parse_relay_id(&relay_id)?;
    let mut builder = Schedule::builder()
        .relay_id(relay_id)
        .start_time(req.start_time)
        .end_time(req.end_time);
    if let Some(active) = req.is_active {
        builder = builder.is_active(active);
    }
    let schedule = builder.build()?;

    let stored = state.control.upsert_schedule(schedule).await?;
    Ok(UpsertResponse::Ok(Json(stored)))
}

/// `DELETE /api/schedules/{relay_id}` — remove the schedule of a relay.
pub async fn delete<S>(
    State(state): State<AppState<S>>,
    Path(relay_id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    S: AutomationControl + Send + Sync + 'static,
{
    let relay_id = parse_relay_id(&relay_id)?;
    state.control.delete_schedule(relay_id).await?;
    Ok(DeleteResponse::NoContent)
}
