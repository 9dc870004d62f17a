//! Schedule monitor — one tick reconciles every active schedule with the
//! current state of its relay.
//!
//! Failures are contained per schedule: a relay that cannot be read or
//! written is skipped for this tick and the others are still processed.

use relayhub_domain::error::HubError;
use relayhub_domain::event::{Event, EventPayload};
use relayhub_domain::notification::Notification;
use relayhub_domain::relay::{RelayObservation, ToggleCommand, state_label};
use relayhub_domain::schedule::Schedule;
use relayhub_domain::time::TimeOfDay;
use serde::Serialize;

use crate::notifications::Notifier;
use crate::ports::{Clock, EventPublisher, RelayLog, RelayStore, ScheduleStore};
use crate::reconciler::reconcile;

/// Summary of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub evaluated: usize,
    pub switched_on: usize,
    pub switched_off: usize,
    pub skipped: usize,
    pub notified: usize,
}

pub struct ScheduleMonitor<S, R, L, N, P, C> {
    schedules: S,
    relays: R,
    log: L,
    notifier: N,
    publisher: P,
    clock: C,
    recipient: Option<String>,
}

impl<S, R, L, N, P, C> ScheduleMonitor<S, R, L, N, P, C>
where
    S: ScheduleStore + Send + Sync,
    R: RelayStore + Send + Sync,
    L: RelayLog + Send + Sync,
    N: Notifier + Send + Sync,
    P: EventPublisher + Send + Sync,
    C: Clock + Send + Sync,
{
    /// `recipient` receives power-down notifications; without one they
    /// are skipped.
    pub fn new(
        schedules: S,
        relays: R,
        log: L,
        notifier: N,
        publisher: P,
        clock: C,
        recipient: Option<String>,
    ) -> Self {
        Self {
            schedules,
            relays,
            log,
            notifier,
            publisher,
            clock,
            recipient,
        }
    }

    pub fn schedules(&self) -> &S {
        &self.schedules
    }

    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Evaluate every active schedule once.
    pub async fn run_tick(&self) -> TickReport {
        let mut report = TickReport::default();
        let schedules = match self.schedules.list_active().await {
            Ok(schedules) => schedules,
            Err(err) => {
                tracing::error!(error = ?err, "failed to list active schedules");
                return report;
            }
        };
        let now = self.clock.local_time();

        for schedule in &schedules {
            report.evaluated += 1;
            let command = match self.apply_schedule(schedule, now).await {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(relay_id = %schedule.relay_id, error = ?err, "skipping schedule this tick");
                    report.skipped += 1;
                    continue;
                }
            };

            if command.target {
                report.switched_on += 1;
            } else {
                report.switched_off += 1;
            }
            if command.is_notifiable() && self.notify_switched_off(schedule, now).await {
                report.notified += 1;
            }
        }

        tracing::debug!(
            evaluated = report.evaluated,
            switched_on = report.switched_on,
            switched_off = report.switched_off,
            skipped = report.skipped,
            "schedule tick complete"
        );
        report
    }

    /// Reconcile one schedule and apply the resulting toggle, if any.
    async fn apply_schedule(
        &self,
        schedule: &Schedule,
        now: TimeOfDay,
    ) -> Result<Option<ToggleCommand>, HubError> {
        let current_state = self.relays.get_state(schedule.relay_id).await?;
        let observation = RelayObservation {
            relay_id: schedule.relay_id,
            current_state,
        };
        let Some(command) = reconcile(schedule, observation, now, self.clock.now()) else {
            return Ok(None);
        };

        self.relays.set_state(command.relay_id, command.target).await?;
        tracing::info!(
            relay_id = %command.relay_id,
            state = state_label(command.target),
            window = %schedule.window(),
            "relay switched by schedule"
        );

        if let Err(err) = self.log.append(command.audit_entry()).await {
            tracing::warn!(relay_id = %command.relay_id, error = ?err, "failed to append relay log");
        }
        let _ = self
            .publisher
            .publish(Event::new(EventPayload::RelaySwitched {
                relay_id: command.relay_id,
                state: command.target,
            }))
            .await;

        Ok(Some(command))
    }

    async fn notify_switched_off(&self, schedule: &Schedule, now: TimeOfDay) -> bool {
        let Some(recipient) = self.recipient.as_deref() else {
            tracing::warn!(relay_id = %schedule.relay_id, "no notification recipient configured");
            return false;
        };
        match Notification::relay_switched_off(recipient, schedule.relay_id, now, schedule.window()) {
            Ok(notification) => {
                let outcome = self.notifier.notify(notification).await;
                tracing::debug!(relay_id = %schedule.relay_id, delivered = outcome.is_delivered(), "power-down notification handed off");
                true
            }
            Err(err) => {
                tracing::warn!(error = ?err, "failed to build power-down notification");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use relayhub_domain::delivery::{DeliveryOutcome, FailureKind};

    use super::*;
    use crate::notifications::NotificationService;
    use crate::retry_queue::RetryQueue;
    use crate::testing::{
        FixedClock, InMemoryRelayLog, InMemoryRelayStore, InMemoryScheduleStore, ScriptedSender,
        SpyPublisher, relay, schedule,
    };

    type Notifications = NotificationService<Arc<ScriptedSender>, Arc<SpyPublisher>>;
    type Monitor = ScheduleMonitor<
        Arc<InMemoryScheduleStore>,
        Arc<InMemoryRelayStore>,
        Arc<InMemoryRelayLog>,
        Arc<Notifications>,
        Arc<SpyPublisher>,
        Arc<FixedClock>,
    >;

    struct Harness {
        monitor: Monitor,
        schedules: Arc<InMemoryScheduleStore>,
        relays: Arc<InMemoryRelayStore>,
        log: Arc<InMemoryRelayLog>,
        sender: Arc<ScriptedSender>,
        queue: Arc<RetryQueue>,
        publisher: Arc<SpyPublisher>,
        clock: Arc<FixedClock>,
    }

    fn harness(schedules: Vec<Schedule>, relays: &[(u16, bool)], at: &str) -> Harness {
        let schedules = Arc::new(InMemoryScheduleStore::with(schedules));
        let relays = Arc::new(InMemoryRelayStore::with(relays));
        let log = Arc::new(InMemoryRelayLog::default());
        let sender = Arc::new(ScriptedSender::default());
        let queue = Arc::new(RetryQueue::default());
        let publisher = Arc::new(SpyPublisher::default());
        let clock = Arc::new(FixedClock::at(at));
        let notifications = Arc::new(NotificationService::new(
            Arc::clone(&sender),
            Arc::clone(&queue),
            Arc::clone(&publisher),
        ));
        let monitor = ScheduleMonitor::new(
            Arc::clone(&schedules),
            Arc::clone(&relays),
            Arc::clone(&log),
            notifications,
            Arc::clone(&publisher),
            Arc::clone(&clock),
            Some("operator".to_string()),
        );
        Harness {
            monitor,
            schedules,
            relays,
            log,
            sender,
            queue,
            publisher,
            clock,
        }
    }

    #[tokio::test]
    async fn should_switch_relay_off_and_notify_when_outside_window() {
        let h = harness(vec![schedule(3, "07:00", "17:00")], &[(3, true)], "18:00");

        let report = h.monitor.run_tick().await;

        assert_eq!(h.relays.state(3), Some(false));
        assert_eq!(report.switched_off, 1);
        assert_eq!(report.notified, 1);
        let entries = h.log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].relay_id, relay(3));
        assert!(!entries[0].state);
        let sent = h.sender.attempts();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Relay channel 3"));
        assert!(sent[0].contains("07:00 - 17:00"));
        assert_eq!(
            h.publisher.kinds(),
            vec!["relay_switched", "automation_notification"]
        );
    }

    #[tokio::test]
    async fn should_switch_relay_on_without_notifying() {
        let h = harness(vec![schedule(1, "07:00", "17:00")], &[(1, false)], "08:30");

        let report = h.monitor.run_tick().await;

        assert_eq!(h.relays.state(1), Some(true));
        assert_eq!(report.switched_on, 1);
        assert_eq!(report.notified, 0);
        assert!(h.sender.attempts().is_empty());
        assert_eq!(h.publisher.kinds(), vec!["relay_switched"]);
    }

    #[tokio::test]
    async fn should_do_nothing_on_repeated_ticks() {
        let h = harness(vec![schedule(3, "07:00", "17:00")], &[(3, true)], "18:00");

        h.monitor.run_tick().await;
        let second = h.monitor.run_tick().await;
        let third = h.monitor.run_tick().await;

        assert_eq!(second, TickReport { evaluated: 1, ..TickReport::default() });
        assert_eq!(third, second);
        assert_eq!(h.log.entries().len(), 1);
        assert_eq!(h.sender.attempts().len(), 1);
    }

    #[tokio::test]
    async fn should_follow_clock_across_window_boundaries() {
        let h = harness(vec![schedule(2, "22:00", "06:00")], &[(2, false)], "21:59");

        assert_eq!(h.monitor.run_tick().await.switched_on, 0);
        h.clock.set("22:00");
        assert_eq!(h.monitor.run_tick().await.switched_on, 1);
        h.clock.set("06:00");
        assert_eq!(h.monitor.run_tick().await.switched_off, 0);
        h.clock.set("06:01");
        assert_eq!(h.monitor.run_tick().await.switched_off, 1);
        assert_eq!(h.relays.state(2), Some(false));
    }

    #[tokio::test]
    async fn should_skip_unknown_relay_and_continue() {
        let h = harness(
            vec![schedule(9, "07:00", "17:00"), schedule(3, "07:00", "17:00")],
            &[(3, true)],
            "18:00",
        );

        let report = h.monitor.run_tick().await;

        assert_eq!(report.evaluated, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.switched_off, 1);
        assert_eq!(h.relays.state(3), Some(false));
    }

    #[tokio::test]
    async fn should_skip_relay_whose_write_fails() {
        let h = harness(
            vec![schedule(1, "07:00", "17:00"), schedule(2, "07:00", "17:00")],
            &[(1, true), (2, true)],
            "18:00",
        );
        h.relays.fail_writes_for(1);

        let report = h.monitor.run_tick().await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.switched_off, 1);
        assert_eq!(h.relays.state(1), Some(true));
        assert_eq!(h.relays.state(2), Some(false));
        assert_eq!(h.sender.attempts().len(), 1);
    }

    #[tokio::test]
    async fn should_keep_toggle_when_log_append_fails() {
        let h = harness(vec![schedule(3, "07:00", "17:00")], &[(3, true)], "18:00");
        h.log.fail_appends();

        let report = h.monitor.run_tick().await;

        assert_eq!(report.switched_off, 1);
        assert_eq!(h.relays.state(3), Some(false));
        assert_eq!(report.notified, 1);
    }

    #[tokio::test]
    async fn should_end_tick_when_listing_fails() {
        let h = harness(vec![schedule(3, "07:00", "17:00")], &[(3, true)], "18:00");
        h.schedules.fail_listing();

        let report = h.monitor.run_tick().await;

        assert_eq!(report, TickReport::default());
        assert_eq!(h.relays.state(3), Some(true));
    }

    #[tokio::test]
    async fn should_ignore_inactive_schedules() {
        let mut inactive = schedule(3, "07:00", "17:00");
        inactive.is_active = false;
        let h = harness(vec![inactive], &[(3, true)], "18:00");

        let report = h.monitor.run_tick().await;

        assert_eq!(report.evaluated, 0);
        assert_eq!(h.relays.state(3), Some(true));
    }

    #[tokio::test]
    async fn should_queue_notification_when_transport_not_ready() {
        let h = harness(vec![schedule(3, "07:00", "17:00")], &[(3, true)], "18:00");
        h.sender.push(DeliveryOutcome::failed(FailureKind::NotReady, "transport not ready"));

        let report = h.monitor.run_tick().await;

        assert_eq!(report.notified, 1);
        assert_eq!(h.queue.len(), 1);
        assert!(h.queue.snapshot()[0].body.contains("Relay channel 3"));
    }
}
