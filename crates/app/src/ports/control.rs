//! Inbound control port — the operations callers (HTTP, CLI, tests) drive
//! the engine through.

use std::future::Future;

use relayhub_domain::connection::ConnectionState;
use relayhub_domain::delivery::DeliveryOutcome;
use relayhub_domain::error::HubError;
use relayhub_domain::id::RelayId;
use relayhub_domain::notification::QueuedMessage;
use relayhub_domain::schedule::Schedule;
use serde::Serialize;

use crate::maintenance::MaintenanceReport;
use crate::schedule_monitor::TickReport;

/// Snapshot of the notification transport as seen by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransportStatus {
    pub state: ConnectionState,
    pub queue_length: usize,
    pub attempts: u32,
    pub max_attempts: u32,
}

pub trait AutomationControl {
    /// Run one schedule monitor tick now. Safe to call repeatedly.
    fn run_schedule_tick(&self) -> impl Future<Output = TickReport> + Send;

    /// Put a message straight on the retry queue.
    fn enqueue_notification(
        &self,
        recipient: String,
        body: String,
    ) -> impl Future<Output = Result<QueuedMessage, HubError>> + Send;

    fn supervisor_status(&self) -> impl Future<Output = TransportStatus> + Send;

    /// Tear the transport down and reconnect with a fresh budget.
    fn restart_transport(&self) -> impl Future<Output = ()> + Send;

    /// Run one maintenance pass now.
    fn refresh_transport(&self) -> impl Future<Output = MaintenanceReport> + Send;

    /// Send a fixed test message to the configured recipient.
    fn send_test_notification(
        &self,
    ) -> impl Future<Output = Result<DeliveryOutcome, HubError>> + Send;

    fn list_schedules(&self) -> impl Future<Output = Result<Vec<Schedule>, HubError>> + Send;

    fn upsert_schedule(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, HubError>> + Send;

    fn delete_schedule(&self, relay_id: RelayId) -> impl Future<Output = Result<(), HubError>> + Send;
}
