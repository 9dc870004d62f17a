//! Connection supervisor — owns the belief state of the messaging transport
//! and drives reconnection.
//!
//! ```text
//!  UNINITIALIZED ──start──▶ CONNECTING ──authenticated──▶ AUTHENTICATED ──ready──▶ READY
//!                               ▲  │                                                │
//!              backoff elapsed  │  └──────────────── ready ────────────────────────▶│
//!                               │                                                   │
//!                         DISCONNECTED ◀─────────── disconnect / session failure ───┘
//!                               │
//!                  budget spent └─▶ stays DISCONNECTED until restart
//!
//!  any ──auth failure──▶ AUTH_FAILED (no automatic recovery)
//! ```
//!
//! Every session started through [`MessagingTransport::initialize`] gets a
//! generation number. Signals from an older generation are ignored, so a
//! late disconnect from a torn-down session cannot knock over its
//! replacement.
//!
//! The state lives behind a [`std::sync::Mutex`] that is never held across
//! an `.await`. The pending reconnection (or delayed restart) is a spawned
//! task whose handle is kept so a restart can abort it.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use relayhub_domain::connection::{ConnectionState, ReconnectBudget, TransportEvent};
use relayhub_domain::event::{Event, EventPayload};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

use crate::ports::{EventPublisher, MessagingTransport};

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Reconnection policy of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Delay before attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
    pub max_attempts: u32,
    /// Pause between tearing down and reconnecting on a manual restart.
    pub restart_delay: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            base_delay: ReconnectBudget::DEFAULT_BASE_DELAY,
            max_attempts: ReconnectBudget::DEFAULT_MAX_ATTEMPTS,
            restart_delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSnapshot {
    pub state: ConnectionState,
    pub attempts: u32,
    pub max_attempts: u32,
}

struct Session {
    state: ConnectionState,
    budget: ReconnectBudget,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
}

impl Session {
    fn abort_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    fn abort_pump(&mut self) {
        if let Some(task) = self.pump.take() {
            task.abort();
        }
    }
}

/// Tracks the transport lifecycle and keeps it connected.
///
/// Methods that may spawn work take `self: &Arc<Self>`; the supervisor is
/// meant to be shared.
pub struct ConnectionSupervisor<T, P> {
    transport: T,
    publisher: P,
    config: SupervisorConfig,
    session: Mutex<Session>,
    ready: Notify,
}

impl<T, P> ConnectionSupervisor<T, P>
where
    T: MessagingTransport + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(transport: T, publisher: P, config: SupervisorConfig) -> Self {
        Self {
            transport,
            publisher,
            session: Mutex::new(Session {
                state: ConnectionState::Uninitialized,
                budget: ReconnectBudget::new(config.max_attempts, config.base_delay),
                generation: 0,
                pending: None,
                pump: None,
            }),
            config,
            ready: Notify::new(),
        }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    #[must_use]
    pub fn is_deliverable(&self) -> bool {
        self.state().is_deliverable()
    }

    #[must_use]
    pub fn snapshot(&self) -> SupervisorSnapshot {
        let session = self.lock();
        SupervisorSnapshot {
            state: session.state,
            attempts: session.budget.attempts(),
            max_attempts: session.budget.max(),
        }
    }

    /// Resolves after the next transition into a ready state.
    ///
    /// A signal raised while nobody waits is kept for the next caller.
    pub async fn wait_ready(&self) {
        self.ready.notified().await;
    }

    /// Open the first transport session. No-op once started.
    pub async fn start(self: &Arc<Self>) {
        let generation = {
            let mut session = self.lock();
            if session.state != ConnectionState::Uninitialized || session.pending.is_some() {
                tracing::debug!(state = %session.state, "transport already started");
                return;
            }
            session.generation += 1;
            session.state = ConnectionState::Connecting;
            session.generation
        };
        tracing::info!(generation, "starting transport session");
        Arc::clone(self).connect(generation).await;
    }

    /// Manual restart: cancel any pending reconnection, tear the session
    /// down, reset the budget and reconnect after `restart_delay`.
    pub async fn restart(self: &Arc<Self>) {
        let generation = {
            let mut session = self.lock();
            session.abort_pending();
            session.abort_pump();
            session.generation += 1;
            session.budget.reset();
            session.state = ConnectionState::Uninitialized;
            session.generation
        };
        let delay = self.config.restart_delay;
        tracing::info!(delay_secs = delay.as_secs(), "restarting transport");
        self.emit(EventPayload::TransportRestarting {
            delay_secs: delay.as_secs(),
        })
        .await;
        self.transport.destroy().await;

        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.resume(generation).await;
        });
        let mut session = self.lock();
        if session.generation == generation {
            session.abort_pending();
            session.pending = Some(task);
        } else {
            task.abort();
        }
    }

    /// A delivery failed in a way that means the session is gone.
    ///
    /// Handled exactly like a disconnect signal from the transport.
    pub async fn report_session_failure(self: &Arc<Self>, reason: String) {
        let generation = self.lock().generation;
        tracing::warn!(%reason, "delivery reported a broken session");
        self.on_disconnect(generation, reason).await;
    }

    /// Compare the belief state with the transport's live status and
    /// correct it when they disagree about deliverability.
    ///
    /// Never schedules a reconnection and never consumes budget. Skipped
    /// while uninitialized or after an authentication failure. Returns the
    /// corrected state, if any.
    pub async fn resync(&self) -> Option<ConnectionState> {
        let believed = self.state();
        if matches!(
            believed,
            ConnectionState::Uninitialized | ConnectionState::AuthFailed
        ) {
            return None;
        }

        let live = match self.transport.status().await {
            Ok(live) => live,
            Err(err) => {
                tracing::warn!(%err, "failed to read transport status");
                return None;
            }
        };
        if live.is_deliverable() == believed.is_deliverable() {
            return None;
        }
        let corrected = if live.is_deliverable() {
            live
        } else {
            ConnectionState::Disconnected
        };

        {
            let mut session = self.lock();
            if session.state != believed {
                return None;
            }
            session.state = corrected;
            if corrected.is_deliverable() {
                session.budget.reset();
                session.abort_pending();
            }
        }

        tracing::info!(previous = %believed, state = %corrected, %live, "corrected transport state");
        if corrected.is_deliverable() {
            self.ready.notify_one();
        }
        self.emit(EventPayload::StatusUpdate {
            previous: believed,
            state: corrected,
        })
        .await;
        Some(corrected)
    }

    /// Abort background work and tear the session down.
    pub async fn shutdown(&self) {
        {
            let mut session = self.lock();
            session.abort_pending();
            session.abort_pump();
            session.generation += 1;
        }
        self.transport.destroy().await;
        tracing::info!("transport shut down");
    }

    // ── Session lifecycle ───────────────────────────────────────────

    fn connect(self: Arc<Self>, generation: u64) -> BoxFuture {
        Box::pin(async move {
            match self.transport.initialize().await {
                Ok(events) => {
                    let pump = tokio::spawn(Arc::clone(&self).pump(generation, events));
                    let mut session = self.lock();
                    if session.generation == generation {
                        session.abort_pump();
                        session.pump = Some(pump);
                    } else {
                        tracing::debug!(generation, "session superseded while initializing");
                        pump.abort();
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, generation, "transport initialize failed");
                    self.on_disconnect(generation, err.to_string()).await;
                }
            }
        })
    }

    async fn pump(self: Arc<Self>, generation: u64, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(generation, event).await;
        }
        tracing::debug!(generation, "transport event stream closed");
    }

    async fn handle_event(self: &Arc<Self>, generation: u64, event: TransportEvent) {
        let current = self.lock().generation;
        if current != generation {
            tracing::debug!(generation, current, ?event, "ignoring event from superseded session");
            return;
        }

        match event {
            TransportEvent::QrChallenge(payload) => {
                tracing::info!("transport requires pairing");
                self.emit(EventPayload::QrChallenge { payload }).await;
            }
            TransportEvent::Authenticated => {
                if self.transition_to(ConnectionState::Authenticated).is_some() {
                    tracing::info!("transport authenticated");
                    self.emit(EventPayload::Authenticated).await;
                }
            }
            TransportEvent::Ready => {
                if self.transition_to(ConnectionState::Ready).is_some() {
                    tracing::info!("transport ready");
                    self.ready.notify_one();
                    self.emit(EventPayload::Ready).await;
                }
            }
            TransportEvent::AuthFailure(reason) => {
                {
                    let mut session = self.lock();
                    session.state = ConnectionState::AuthFailed;
                    session.abort_pending();
                }
                tracing::error!(%reason, "transport authentication failed");
                self.emit(EventPayload::AuthFailure { reason }).await;
            }
            TransportEvent::Disconnected(reason) => self.on_disconnect(generation, reason).await,
        }
    }

    /// Move into `Authenticated` or `Ready`, resetting the budget.
    ///
    /// Returns the previous state, or `None` when the current state does
    /// not accept the signal.
    fn transition_to(&self, target: ConnectionState) -> Option<ConnectionState> {
        let mut session = self.lock();
        let previous = session.state;
        let accepted = match target {
            ConnectionState::Authenticated => matches!(
                previous,
                ConnectionState::Connecting | ConnectionState::Disconnected
            ),
            ConnectionState::Ready => matches!(
                previous,
                ConnectionState::Connecting
                    | ConnectionState::Authenticated
                    | ConnectionState::Disconnected
            ),
            _ => false,
        };
        if !accepted {
            tracing::debug!(state = %previous, %target, "ignoring transport signal");
            return None;
        }
        session.state = target;
        session.budget.reset();
        session.abort_pending();
        Some(previous)
    }

    async fn on_disconnect(self: &Arc<Self>, generation: u64, reason: String) {
        let decision = {
            let mut session = self.lock();
            let idle_after_resync = session.state == ConnectionState::Disconnected
                && session.pending.is_none()
                && !session.budget.is_exhausted();
            if session.generation != generation || !(session.state.is_live() || idle_after_resync) {
                tracing::debug!(state = %session.state, %reason, "ignoring disconnect");
                return;
            }
            session.state = ConnectionState::Disconnected;
            match session.budget.next_attempt() {
                Some((attempt, delay)) => {
                    let task = self.spawn_reconnect(generation, attempt, delay);
                    session.abort_pending();
                    session.pending = Some(task);
                    Ok((attempt, delay))
                }
                None => Err(session.budget.attempts()),
            }
        };

        tracing::warn!(%reason, "transport disconnected");
        self.emit(EventPayload::Disconnected { reason }).await;

        match decision {
            Ok((attempt, delay)) => {
                if self.lock().generation != generation {
                    tracing::debug!(generation, "reconnect superseded by restart");
                    return;
                }
                let max_attempts = self.config.max_attempts;
                tracing::info!(
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    "scheduling reconnect"
                );
                self.emit(EventPayload::ReconnectScheduled {
                    attempt,
                    max_attempts,
                    delay_secs: delay.as_secs(),
                })
                .await;
            }
            Err(attempts) => {
                tracing::error!(attempts, "reconnect attempts exhausted, waiting for manual restart");
                self.emit(EventPayload::ReconnectExhausted { attempts }).await;
            }
        }
    }

    /// Call with the session lock held.
    fn spawn_reconnect(self: &Arc<Self>, generation: u64, attempt: u32, delay: Duration) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.reconnect(generation, attempt).await;
        })
    }

    async fn reconnect(self: Arc<Self>, generation: u64, attempt: u32) {
        let generation = {
            let mut session = self.lock();
            if session.generation != generation {
                tracing::debug!(generation, "reconnect superseded");
                return;
            }
            // Our own handle: detach it rather than abort ourselves.
            drop(session.pending.take());
            if session.state != ConnectionState::Disconnected {
                tracing::debug!(state = %session.state, "reconnect no longer needed");
                return;
            }
            session.abort_pump();
            session.generation += 1;
            session.state = ConnectionState::Connecting;
            session.generation
        };
        tracing::info!(attempt, generation, "reconnecting transport");
        self.transport.destroy().await;
        self.connect(generation).await;
    }

    async fn resume(self: Arc<Self>, generation: u64) {
        {
            let mut session = self.lock();
            drop(session.pending.take());
            if session.generation != generation
                || session.state != ConnectionState::Uninitialized
            {
                return;
            }
            session.state = ConnectionState::Connecting;
        }
        tracing::info!(generation, "reconnecting transport after restart");
        self.connect(generation).await;
    }

    async fn emit(&self, payload: EventPayload) {
        let _ = self.publisher.publish(Event::new(payload)).await;
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
