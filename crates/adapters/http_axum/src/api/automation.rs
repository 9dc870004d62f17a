//! On-demand schedule evaluation.

use axum::Json;
use axum::extract::State;

use relayhub_app::ports::AutomationControl;
use relayhub_app::schedule_monitor::TickReport;

use crate::state::AppState;

/// `POST /api/automation/tick` — run one schedule tick now.
pub async fn tick<S>(State(state): State<AppState<S>>) -> Json<TickReport>
where
    S: AutomationControl + Send + Sync + 'static,
{
    Json(state.control.run_schedule_tick().await)
}
