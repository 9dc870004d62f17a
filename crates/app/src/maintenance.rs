//! Maintenance — keeps the supervisor's belief honest and flushes the
//! retry queue whenever delivery is possible.

use std::sync::Arc;
use std::time::Duration;

use relayhub_domain::connection::ConnectionState;
use serde::Serialize;

use crate::dispatcher::NotificationSender;
use crate::ports::{EventPublisher, MessagingTransport};
use crate::retry_queue::{DrainReport, RetryQueue};
use crate::supervisor::ConnectionSupervisor;

/// What one maintenance pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    /// State after the pass.
    pub state: ConnectionState,
    /// Set when resync corrected the belief state.
    pub corrected: Option<ConnectionState>,
    /// Set when the queue was drained.
    pub drained: Option<DrainReport>,
}

pub struct Maintenance<T, P, D> {
    supervisor: Arc<ConnectionSupervisor<T, P>>,
    queue: Arc<RetryQueue>,
    sender: D,
    ready_settle: Duration,
}

impl<T, P, D> Maintenance<T, P, D>
where
    T: MessagingTransport + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    D: NotificationSender + Send + Sync,
{
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);
    pub const DEFAULT_READY_SETTLE: Duration = Duration::from_secs(2);

    pub fn new(
        supervisor: Arc<ConnectionSupervisor<T, P>>,
        queue: Arc<RetryQueue>,
        sender: D,
        ready_settle: Duration,
    ) -> Self {
        Self {
            supervisor,
            queue,
            sender,
            ready_settle,
        }
    }

    /// Resync the supervisor, then drain the queue if delivery is possible.
    pub async fn run_once(&self) -> MaintenanceReport {
        let corrected = self.supervisor.resync().await;
        let drained = if self.supervisor.is_deliverable() && !self.queue.is_empty() {
            Some(self.queue.drain_once(&self.sender).await)
        } else {
            None
        };
        MaintenanceReport {
            state: self.supervisor.state(),
            corrected,
            drained,
        }
    }

    /// Drain the queue shortly after every transition into a ready state.
    ///
    /// Runs until the task is aborted.
    pub async fn flush_on_ready(&self) {
        loop {
            self.supervisor.wait_ready().await;
            tokio::time::sleep(self.ready_settle).await;
            if !self.supervisor.is_deliverable() {
                continue;
            }
            let pending = self.queue.len();
            if pending > 0 {
                tracing::info!(pending, "transport ready, flushing retry queue");
                self.queue.drain_once(&self.sender).await;
            }
        }
    }
}
