//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod automation;
#[allow(clippy::missing_errors_doc)]
pub mod notifications;
#[allow(clippy::missing_errors_doc)]
pub mod schedules;
pub mod sse;
pub mod transport;

use axum::Router;
use axum::routing::{get, post, put};

use relayhub_app::ports::AutomationControl;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: AutomationControl + Send + Sync + 'static,
{
    Router::new()
        // Schedules
        .route("/schedules", get(schedules::list::<S>))
        .route(
            "/schedules/{relay_id}",
            put(schedules::upsert::<S>).delete(schedules::delete::<S>),
        )
        // Engine
        .route("/automation/tick", post(automation::tick::<S>))
        // Transport
        .route("/transport/status", get(transport::status::<S>))
        .route("/transport/restart", post(transport::restart::<S>))
        .route("/transport/refresh", post(transport::refresh::<S>))
        // Notifications
        .route("/notifications", post(notifications::enqueue::<S>))
        .route("/notifications/test", post(notifications::test::<S>))
        // Realtime
        .route("/events/stream", get(sse::stream::<S>))
}
