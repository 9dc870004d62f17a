//! Automation service — wires the supervisor, delivery path, retry queue
//! and schedule monitor together and exposes them through
//! [`AutomationControl`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use relayhub_domain::delivery::DeliveryOutcome;
use relayhub_domain::error::{HubError, ValidationError};
use relayhub_domain::id::RelayId;
use relayhub_domain::notification::{MessageCategory, Notification, QueuedMessage};
use relayhub_domain::schedule::Schedule;

use crate::dispatcher::Dispatcher;
use crate::maintenance::{Maintenance, MaintenanceReport};
use crate::notifications::NotificationService;
use crate::ports::{
    AutomationControl, Clock, EventPublisher, MessagingTransport, RelayLog, RelayStore,
    ScheduleStore, TransportStatus,
};
use crate::retry_queue::RetryQueue;
use crate::schedule_monitor::{ScheduleMonitor, TickReport};
use crate::scheduler::{PeriodicHandle, spawn_delayed, spawn_periodic};
use crate::supervisor::{ConnectionSupervisor, SupervisorConfig};

/// Timings and recipient of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub tick_interval: Duration,
    /// Delay before the first schedule tick.
    pub startup_delay: Duration,
    pub notify_recipient: Option<String>,
    pub supervisor: SupervisorConfig,
    pub send_timeout: Duration,
    pub maintenance_interval: Duration,
    pub inter_message_delay: Duration,
    /// Pause between a ready signal and the queue flush.
    pub ready_settle: Duration,
    /// Delay before the first transport session is opened.
    pub transport_start_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            startup_delay: Duration::from_secs(5),
            notify_recipient: None,
            supervisor: SupervisorConfig::default(),
            send_timeout: Duration::from_secs(45),
            maintenance_interval: Duration::from_secs(15),
            inter_message_delay: Duration::from_secs(2),
            ready_settle: Duration::from_secs(2),
            transport_start_delay: Duration::from_secs(2),
        }
    }
}

type Delivery<T, P> = Arc<Dispatcher<T, P>>;
type Notifications<T, P> = Arc<NotificationService<Delivery<T, P>, P>>;

/// Background tasks of a running engine; dropping this stops them.
#[derive(Debug)]
pub struct BackgroundTasks {
    handles: Vec<PeriodicHandle>,
}

impl BackgroundTasks {
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.handles.iter().map(PeriodicHandle::name).collect()
    }

    pub fn cancel(&self) {
        for handle in &self.handles {
            handle.cancel();
        }
    }
}

pub struct AutomationService<T, P, S, R, L, C> {
    supervisor: Arc<ConnectionSupervisor<T, P>>,
    queue: Arc<RetryQueue>,
    notifications: Notifications<T, P>,
    monitor: ScheduleMonitor<S, R, L, Notifications<T, P>, P, C>,
    maintenance: Arc<Maintenance<T, P, Delivery<T, P>>>,
    settings: EngineSettings,
}

impl<T, P, S, R, L, C> AutomationService<T, P, S, R, L, C>
where
    T: MessagingTransport + Send + Sync + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    R: RelayStore + Send + Sync + 'static,
    L: RelayLog + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    pub fn new(
        transport: T,
        publisher: P,
        schedules: S,
        relays: R,
        log: L,
        clock: C,
        settings: EngineSettings,
    ) -> Self {
        let supervisor = Arc::new(ConnectionSupervisor::new(
            transport,
            publisher.clone(),
            settings.supervisor,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&supervisor),
            settings.send_timeout,
        ));
        let queue = Arc::new(RetryQueue::new(settings.inter_message_delay));
        let notifications = Arc::new(NotificationService::new(
            Arc::clone(&dispatcher),
            Arc::clone(&queue),
            publisher.clone(),
        ));
        let monitor = ScheduleMonitor::new(
            schedules,
            relays,
            log,
            Arc::clone(&notifications),
            publisher,
            clock,
            settings.notify_recipient.clone(),
        );
        let maintenance = Arc::new(Maintenance::new(
            Arc::clone(&supervisor),
            Arc::clone(&queue),
            dispatcher,
            settings.ready_settle,
        ));
        Self {
            supervisor,
            queue,
            notifications,
            monitor,
            maintenance,
            settings,
        }
    }

    pub fn supervisor(&self) -> &Arc<ConnectionSupervisor<T, P>> {
        &self.supervisor
    }

    pub fn queue(&self) -> &Arc<RetryQueue> {
        &self.queue
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Start the schedule tick, maintenance pass, ready flush and the
    /// delayed transport start.
    pub fn spawn_background(self: &Arc<Self>) -> BackgroundTasks {
        let tick = {
            let service = Arc::clone(self);
            spawn_periodic(
                "schedule-tick",
                self.settings.startup_delay,
                self.settings.tick_interval,
                move || {
                    let service = Arc::clone(&service);
                    async move {
                        service.monitor.run_tick().await;
                    }
                },
            )
        };
        let maintenance = {
            let maintenance = Arc::clone(&self.maintenance);
            spawn_periodic(
                "maintenance",
                self.settings.maintenance_interval,
                self.settings.maintenance_interval,
                move || {
                    let maintenance = Arc::clone(&maintenance);
                    async move {
                        let report = maintenance.run_once().await;
                        if report.corrected.is_some() || report.drained.is_some() {
                            tracing::info!(state = %report.state, "maintenance pass acted");
                        }
                    }
                },
            )
        };
        let flush = {
            let maintenance = Arc::clone(&self.maintenance);
            spawn_delayed("ready-flush", Duration::ZERO, async move {
                maintenance.flush_on_ready().await;
            })
        };
        let start = {
            let supervisor = Arc::clone(&self.supervisor);
            spawn_delayed(
                "transport-start",
                self.settings.transport_start_delay,
                async move { supervisor.start().await },
            )
        };

        tracing::info!(
            tick_secs = self.settings.tick_interval.as_secs(),
            maintenance_secs = self.settings.maintenance_interval.as_secs(),
            "automation engine started"
        );
        BackgroundTasks {
            handles: vec![tick, maintenance, flush, start],
        }
    }

    /// Tear the transport session down.
    pub async fn shutdown(&self) {
        self.supervisor.shutdown().await;
    }

    async fn test_notification(&self) -> Result<DeliveryOutcome, HubError> {
        let recipient = self
            .settings
            .notify_recipient
            .as_deref()
            .ok_or(ValidationError::EmptyRecipient)?;
        let notification = Notification::test_message(recipient, self.monitor.clock().local_time())?;
        Ok(self.notifications.deliver(notification).await)
    }

    fn status(&self) -> TransportStatus {
        let snapshot = self.supervisor.snapshot();
        TransportStatus {
            state: snapshot.state,
            queue_length: self.queue.len(),
            attempts: snapshot.attempts,
            max_attempts: snapshot.max_attempts,
        }
    }
}

impl<T, P, S, R, L, C> AutomationControl for AutomationService<T, P, S, R, L, C>
where
    T: MessagingTransport + Send + Sync + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    R: RelayStore + Send + Sync + 'static,
    L: RelayLog + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn run_schedule_tick(&self) -> impl Future<Output = TickReport> + Send {
        self.monitor.run_tick()
    }

    fn enqueue_notification(
        &self,
        recipient: String,
        body: String,
    ) -> impl Future<Output = Result<QueuedMessage, HubError>> + Send {
        let queued = Notification::new(recipient, body, MessageCategory::Manual)
            .map(|notification| self.notifications.enqueue(notification));
        std::future::ready(queued)
    }

    fn supervisor_status(&self) -> impl Future<Output = TransportStatus> + Send {
        std::future::ready(self.status())
    }

    fn restart_transport(&self) -> impl Future<Output = ()> + Send {
        self.supervisor.restart()
    }

    fn refresh_transport(&self) -> impl Future<Output = MaintenanceReport> + Send {
        self.maintenance.run_once()
    }

    fn send_test_notification(
        &self,
    ) -> impl Future<Output = Result<DeliveryOutcome, HubError>> + Send {
        self.test_notification()
    }

    fn list_schedules(&self) -> impl Future<Output = Result<Vec<Schedule>, HubError>> + Send {
        self.monitor.schedules().list_all()
    }

    fn upsert_schedule(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, HubError>> + Send {
        self.monitor.schedules().upsert(schedule)
    }

    fn delete_schedule(&self, relay_id: RelayId) -> impl Future<Output = Result<(), HubError>> + Send {
        self.monitor.schedules().delete(relay_id)
    }
}
