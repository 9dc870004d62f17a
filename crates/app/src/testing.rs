//! In-memory fakes of the ports, shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use relayhub_domain::connection::{ConnectionState, TransportEvent};
use relayhub_domain::delivery::DeliveryOutcome;
use relayhub_domain::error::{HubError, NotFoundError, TransportError};
use relayhub_domain::event::{Event, EventPayload};
use relayhub_domain::id::RelayId;
use relayhub_domain::relay::{RelayLogEntry, RelayObservation};
use relayhub_domain::schedule::Schedule;
use relayhub_domain::time::{TimeOfDay, Timestamp};
use tokio::sync::{Semaphore, mpsc};

use crate::dispatcher::NotificationSender;
use crate::ports::{Clock, EventPublisher, MessagingTransport, RelayLog, RelayStore, ScheduleStore};

pub fn relay(n: u16) -> RelayId {
    RelayId::new(n).unwrap()
}

pub fn tod(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

pub fn schedule(relay_id: u16, start: &str, end: &str) -> Schedule {
    Schedule::builder()
        .relay_id(relay(relay_id))
        .start_time(tod(start))
        .end_time(tod(end))
        .build()
        .unwrap()
}

/// Let spawned tasks run. Under a paused clock the runtime only
/// auto-advances once every task is idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// ── Spy publisher ──────────────────────────────────────────────

#[derive(Default)]
pub struct SpyPublisher {
    events: Mutex<Vec<Event>>,
    gate: Mutex<Option<(&'static str, Arc<Semaphore>)>>,
}

impl SpyPublisher {
    /// Make every publish of `kind` wait for a permit on the returned
    /// semaphore. The event is recorded before waiting.
    pub fn hold(&self, kind: &'static str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some((kind, Arc::clone(&gate)));
        gate
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(Event::kind).collect()
    }

    pub fn payloads(&self) -> Vec<EventPayload> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.payload.clone())
            .collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

impl EventPublisher for SpyPublisher {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HubError>> + Send {
        let gate = self
            .gate
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(kind, _)| *kind == event.kind())
            .map(|(_, gate)| Arc::clone(gate));
        self.events.lock().unwrap().push(event);
        async move {
            if let Some(gate) = gate {
                let _permit = gate.acquire_owned().await;
            }
            Ok(())
        }
    }
}

// ── Fake transport ─────────────────────────────────────────────

#[derive(Default)]
struct FakeTransportState {
    status: Option<ConnectionState>,
    session: Option<mpsc::Sender<TransportEvent>>,
    init_failures: VecDeque<String>,
    send_results: VecDeque<Result<(), TransportError>>,
    hang_sends: bool,
    delivered: Vec<(String, String)>,
    send_attempts: usize,
    initialize_calls: usize,
    destroy_calls: usize,
}

/// Scriptable transport: tests push session events and queue the results
/// of upcoming `initialize` and `send` calls.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeTransportState>,
}

impl FakeTransport {
    /// Emit a lifecycle signal on the current session.
    pub fn emit(&self, event: TransportEvent) {
        let state = self.state.lock().unwrap();
        let session = state.session.as_ref().expect("no live session");
        session.try_send(event).unwrap();
    }

    pub fn set_status(&self, status: ConnectionState) {
        self.state.lock().unwrap().status = Some(status);
    }

    pub fn fail_next_initialize(&self, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .init_failures
            .push_back(reason.to_string());
    }

    pub fn push_send_result(&self, result: Result<(), TransportError>) {
        self.state.lock().unwrap().send_results.push_back(result);
    }

    pub fn hang_sends(&self) {
        self.state.lock().unwrap().hang_sends = true;
    }

    pub fn delivered(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().delivered.clone()
    }

    pub fn delivered_bodies(&self) -> Vec<String> {
        self.delivered().into_iter().map(|(_, body)| body).collect()
    }

    pub fn send_attempts(&self) -> usize {
        self.state.lock().unwrap().send_attempts
    }

    pub fn initialize_calls(&self) -> usize {
        self.state.lock().unwrap().initialize_calls
    }

    pub fn destroy_calls(&self) -> usize {
        self.state.lock().unwrap().destroy_calls
    }
}

impl MessagingTransport for FakeTransport {
    fn initialize(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<TransportEvent>, TransportError>> + Send {
        let mut state = self.state.lock().unwrap();
        state.initialize_calls += 1;
        let result = match state.init_failures.pop_front() {
            Some(reason) => Err(TransportError::failure(reason)),
            None => {
                let (tx, rx) = mpsc::channel(16);
                state.session = Some(tx);
                Ok(rx)
            }
        };
        async move { result }
    }

    fn status(&self) -> impl Future<Output = Result<ConnectionState, TransportError>> + Send {
        let status = self.state.lock().unwrap().status;
        async move { status.ok_or(TransportError::NotInitialized) }
    }

    fn send(
        &self,
        recipient: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        let mut state = self.state.lock().unwrap();
        state.send_attempts += 1;
        let hang = state.hang_sends;
        let result = state.send_results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() && !hang {
            state.delivered.push((recipient.to_string(), body.to_string()));
        }
        async move {
            if hang {
                std::future::pending::<()>().await;
            }
            result
        }
    }

    fn destroy(&self) -> impl Future<Output = ()> + Send {
        let mut state = self.state.lock().unwrap();
        state.destroy_calls += 1;
        state.session = None;
        async {}
    }
}

// ── Scripted sender ────────────────────────────────────────────

/// A [`NotificationSender`] replaying queued outcomes (default: delivered).
#[derive(Default)]
pub struct ScriptedSender {
    outcomes: Mutex<VecDeque<DeliveryOutcome>>,
    sent: Mutex<Vec<String>>,
}

impl ScriptedSender {
    pub fn push(&self, outcome: DeliveryOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Bodies of every send attempt, in order.
    pub fn attempts(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSender for ScriptedSender {
    fn send(&self, _recipient: &str, body: &str) -> impl Future<Output = DeliveryOutcome> + Send {
        self.sent.lock().unwrap().push(body.to_string());
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DeliveryOutcome::Delivered);
        async move { outcome }
    }
}

// ── Stores ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryScheduleStore {
    schedules: Mutex<Vec<Schedule>>,
    fail_listing: Mutex<bool>,
}

impl InMemoryScheduleStore {
    pub fn with(schedules: Vec<Schedule>) -> Self {
        Self {
            schedules: Mutex::new(schedules),
            fail_listing: Mutex::new(false),
        }
    }

    pub fn fail_listing(&self) {
        *self.fail_listing.lock().unwrap() = true;
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn list_active(&self) -> impl Future<Output = Result<Vec<Schedule>, HubError>> + Send {
        let result = if *self.fail_listing.lock().unwrap() {
            Err(HubError::Storage("schedule table unavailable".into()))
        } else {
            Ok(self
                .schedules
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.is_active)
                .cloned()
                .collect())
        };
        async move { result }
    }

    fn list_all(&self) -> impl Future<Output = Result<Vec<Schedule>, HubError>> + Send {
        let all = self.schedules.lock().unwrap().clone();
        async move { Ok(all) }
    }

    fn upsert(&self, schedule: Schedule) -> impl Future<Output = Result<Schedule, HubError>> + Send {
        let mut schedules = self.schedules.lock().unwrap();
        let stored = match schedules.iter_mut().find(|s| s.relay_id == schedule.relay_id) {
            Some(existing) => {
                *existing = Schedule {
                    id: existing.id,
                    ..schedule
                };
                existing.clone()
            }
            None => {
                schedules.push(schedule.clone());
                schedule
            }
        };
        async move { Ok(stored) }
    }

    fn delete(&self, relay_id: RelayId) -> impl Future<Output = Result<(), HubError>> + Send {
        let mut schedules = self.schedules.lock().unwrap();
        let before = schedules.len();
        schedules.retain(|s| s.relay_id != relay_id);
        let result = if schedules.len() == before {
            Err(NotFoundError {
                entity: "Schedule",
                id: relay_id.to_string(),
            }
            .into())
        } else {
            Ok(())
        };
        async move { result }
    }
}

#[derive(Default)]
pub struct InMemoryRelayStore {
    states: Mutex<HashMap<RelayId, bool>>,
    failing_writes: Mutex<Vec<RelayId>>,
}

impl InMemoryRelayStore {
    pub fn with(states: &[(u16, bool)]) -> Self {
        let store = Self::default();
        for (id, state) in states {
            store.states.lock().unwrap().insert(relay(*id), *state);
        }
        store
    }

    pub fn state(&self, relay_id: u16) -> Option<bool> {
        self.states.lock().unwrap().get(&relay(relay_id)).copied()
    }

    pub fn fail_writes_for(&self, relay_id: u16) {
        self.failing_writes.lock().unwrap().push(relay(relay_id));
    }
}

impl RelayStore for InMemoryRelayStore {
    fn get_state(&self, relay_id: RelayId) -> impl Future<Output = Result<bool, HubError>> + Send {
        let result = self
            .states
            .lock()
            .unwrap()
            .get(&relay_id)
            .copied()
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Relay",
                    id: relay_id.to_string(),
                }
                .into()
            });
        async move { result }
    }

    fn set_state(
        &self,
        relay_id: RelayId,
        state: bool,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        let result = if self.failing_writes.lock().unwrap().contains(&relay_id) {
            Err(HubError::Storage("relay table is read-only".into()))
        } else {
            self.states.lock().unwrap().insert(relay_id, state);
            Ok(())
        };
        async move { result }
    }

    fn list(&self) -> impl Future<Output = Result<Vec<RelayObservation>, HubError>> + Send {
        let mut all: Vec<_> = self
            .states
            .lock()
            .unwrap()
            .iter()
            .map(|(relay_id, current_state)| RelayObservation {
                relay_id: *relay_id,
                current_state: *current_state,
            })
            .collect();
        all.sort_by_key(|o| o.relay_id.get());
        async move { Ok(all) }
    }
}

#[derive(Default)]
pub struct InMemoryRelayLog {
    entries: Mutex<Vec<RelayLogEntry>>,
    failing: Mutex<bool>,
}

impl InMemoryRelayLog {
    pub fn entries(&self) -> Vec<RelayLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn fail_appends(&self) {
        *self.failing.lock().unwrap() = true;
    }
}

impl RelayLog for InMemoryRelayLog {
    fn append(&self, entry: RelayLogEntry) -> impl Future<Output = Result<(), HubError>> + Send {
        let result = if *self.failing.lock().unwrap() {
            Err(HubError::Storage("relay log is full".into()))
        } else {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        };
        async move { result }
    }
}

// ── Clock ──────────────────────────────────────────────────────

pub struct FixedClock {
    local: Mutex<TimeOfDay>,
}

impl FixedClock {
    pub fn at(time: &str) -> Self {
        Self {
            local: Mutex::new(tod(time)),
        }
    }

    pub fn set(&self, time: &str) {
        *self.local.lock().unwrap() = tod(time);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        relayhub_domain::time::now()
    }

    fn local_time(&self) -> TimeOfDay {
        *self.local.lock().unwrap()
    }
}
