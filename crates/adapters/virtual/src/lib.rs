//! # relayhub-adapter-virtual
//!
//! Virtual messaging transport that simulates a paired messaging session
//! for testing and demonstration purposes.
//!
//! ## Behaviour
//!
//! | Setting | Effect on `initialize` |
//! |---------|------------------------|
//! | `require_pairing` | emits a QR challenge and waits for [`VirtualTransport::pair`] |
//! | `auto_ready` | emits `Authenticated` then `Ready` right away (once paired) |
//!
//! Sent messages land in an in-memory outbox. Session drops, auth failures
//! and send failures can be injected.
//!
//! ## Dependency rule
//!
//! Depends on `relayhub-app` (port traits) and `relayhub-domain` only.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use relayhub_app::ports::MessagingTransport;
use relayhub_domain::connection::{ConnectionState, TransportEvent};
use relayhub_domain::error::TransportError;
use serde::Deserialize;
use tokio::sync::mpsc;

const EVENT_BUFFER: usize = 16;
const PAIRING_PAYLOAD: &str = "relayhub-virtual-pairing";

/// Settings of the simulated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VirtualTransportConfig {
    /// Become ready without outside help once paired.
    pub auto_ready: bool,
    /// Start unpaired: a QR challenge is emitted and the session waits.
    pub require_pairing: bool,
}

impl Default for VirtualTransportConfig {
    fn default() -> Self {
        Self {
            auto_ready: true,
            require_pairing: false,
        }
    }
}

/// A message accepted by the virtual transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub body: String,
}

#[derive(Default)]
struct Session {
    events: Option<mpsc::Sender<TransportEvent>>,
    state: ConnectionState,
    paired: bool,
    outbox: Vec<SentMessage>,
    send_faults: VecDeque<String>,
    sessions_opened: usize,
}

impl Session {
    fn emit(&mut self, event: TransportEvent) {
        let Some(events) = &self.events else {
            tracing::debug!(?event, "no open session, dropping event");
            return;
        };
        if let Err(err) = events.try_send(event) {
            tracing::warn!(%err, "virtual transport event dropped");
        }
    }

    fn become_ready(&mut self) {
        self.paired = true;
        self.state = ConnectionState::Ready;
        self.emit(TransportEvent::Authenticated);
        self.emit(TransportEvent::Ready);
    }
}

/// Simulated [`MessagingTransport`].
pub struct VirtualTransport {
    config: VirtualTransportConfig,
    session: Mutex<Session>,
}

impl Default for VirtualTransport {
    fn default() -> Self {
        Self::new(VirtualTransportConfig::default())
    }
}

impl VirtualTransport {
    #[must_use]
    pub fn new(config: VirtualTransportConfig) -> Self {
        Self {
            config,
            session: Mutex::new(Session::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Complete pairing of the open session.
    pub fn pair(&self) {
        let mut session = self.lock();
        if session.events.is_none() {
            tracing::warn!("pairing requested without an open session");
            return;
        }
        tracing::info!("virtual transport paired");
        session.become_ready();
    }

    /// Simulate the remote end closing the session.
    pub fn drop_session(&self, reason: &str) {
        let mut session = self.lock();
        session.state = ConnectionState::Disconnected;
        session.emit(TransportEvent::Disconnected(reason.to_string()));
    }

    /// Simulate the remote end rejecting the credentials.
    pub fn fail_auth(&self, reason: &str) {
        let mut session = self.lock();
        session.state = ConnectionState::AuthFailed;
        session.paired = false;
        session.emit(TransportEvent::AuthFailure(reason.to_string()));
    }

    /// Change what `status` reports without emitting any event.
    pub fn set_state_silently(&self, state: ConnectionState) {
        self.lock().state = state;
    }

    /// Make the next `send` fail with `error`.
    pub fn inject_send_failure(&self, error: &str) {
        self.lock().send_faults.push_back(error.to_string());
    }

    #[must_use]
    pub fn outbox(&self) -> Vec<SentMessage> {
        self.lock().outbox.clone()
    }

    #[must_use]
    pub fn sessions_opened(&self) -> usize {
        self.lock().sessions_opened
    }
}

impl MessagingTransport for VirtualTransport {
    fn initialize(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<TransportEvent>, TransportError>> + Send {
        let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
        {
            let mut session = self.lock();
            session.events = Some(sender);
            session.state = ConnectionState::Connecting;
            session.sessions_opened += 1;

            if self.config.require_pairing && !session.paired {
                tracing::info!(payload = PAIRING_PAYLOAD, "virtual transport awaiting pairing");
                session.emit(TransportEvent::QrChallenge(PAIRING_PAYLOAD.to_string()));
            } else if self.config.auto_ready {
                session.become_ready();
            }
        }
        async move { Ok(receiver) }
    }

    fn status(&self) -> impl Future<Output = Result<ConnectionState, TransportError>> + Send {
        let session = self.lock();
        let result = if session.events.is_some() {
            Ok(session.state)
        } else {
            Err(TransportError::NotInitialized)
        };
        async move { result }
    }

    fn send(
        &self,
        recipient: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        let mut session = self.lock();
        let result = if session.events.is_none() {
            Err(TransportError::NotInitialized)
        } else if let Some(fault) = session.send_faults.pop_front() {
            Err(TransportError::failure(fault))
        } else if !session.state.is_deliverable() {
            Err(TransportError::failure("Session closed"))
        } else {
            session.outbox.push(SentMessage {
                recipient: recipient.to_string(),
                body: body.to_string(),
            });
            Ok(())
        };
        async move { result }
    }

    fn destroy(&self) -> impl Future<Output = ()> + Send {
        let mut session = self.lock();
        session.events = None;
        session.state = ConnectionState::Uninitialized;
        async {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(receiver: &mut mpsc::Receiver<TransportEvent>) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn should_become_ready_on_initialize_when_auto_ready() {
        let transport = VirtualTransport::default();

        let mut events = transport.initialize().await.unwrap();

        assert_eq!(
            drain(&mut events),
            vec![TransportEvent::Authenticated, TransportEvent::Ready]
        );
        assert_eq!(transport.status().await.unwrap(), ConnectionState::Ready);
    }

    #[tokio::test]
    async fn should_emit_qr_challenge_when_pairing_required() {
        let transport = VirtualTransport::new(VirtualTransportConfig {
            auto_ready: true,
            require_pairing: true,
        });

        let mut events = transport.initialize().await.unwrap();

        assert_eq!(
            drain(&mut events),
            vec![TransportEvent::QrChallenge(PAIRING_PAYLOAD.to_string())]
        );
        assert_eq!(transport.status().await.unwrap(), ConnectionState::Connecting);

        transport.pair();
        assert_eq!(
            drain(&mut events),
            vec![TransportEvent::Authenticated, TransportEvent::Ready]
        );
    }

    #[tokio::test]
    async fn should_skip_pairing_on_new_session_once_paired() {
        let transport = VirtualTransport::new(VirtualTransportConfig {
            auto_ready: true,
            require_pairing: true,
        });
        transport.initialize().await.unwrap();
        transport.pair();

        let mut events = transport.initialize().await.unwrap();

        assert_eq!(drain(&mut events).last(), Some(&TransportEvent::Ready));
        assert_eq!(transport.sessions_opened(), 2);
    }

    #[tokio::test]
    async fn should_stay_connecting_without_auto_ready() {
        let transport = VirtualTransport::new(VirtualTransportConfig {
            auto_ready: false,
            require_pairing: false,
        });

        let mut events = transport.initialize().await.unwrap();

        assert!(drain(&mut events).is_empty());
        assert_eq!(transport.status().await.unwrap(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn should_report_not_initialized_before_first_session() {
        let transport = VirtualTransport::default();

        assert!(matches!(
            transport.status().await,
            Err(TransportError::NotInitialized)
        ));
        assert!(matches!(
            transport.send("operator", "hi").await,
            Err(TransportError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn should_record_sent_messages_in_outbox() {
        let transport = VirtualTransport::default();
        transport.initialize().await.unwrap();

        transport.send("operator", "hello").await.unwrap();

        assert_eq!(
            transport.outbox(),
            vec![SentMessage {
                recipient: "operator".to_string(),
                body: "hello".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn should_fail_next_send_when_fault_injected() {
        let transport = VirtualTransport::default();
        transport.initialize().await.unwrap();
        transport.inject_send_failure("Evaluation failed: Protocol error");

        let first = transport.send("operator", "a").await;
        let second = transport.send("operator", "b").await;

        assert_eq!(
            first.unwrap_err().to_string(),
            "Evaluation failed: Protocol error"
        );
        assert!(second.is_ok());
        assert_eq!(transport.outbox().len(), 1);
    }

    #[tokio::test]
    async fn should_emit_disconnect_and_refuse_sends_when_session_dropped() {
        let transport = VirtualTransport::default();
        let mut events = transport.initialize().await.unwrap();
        drain(&mut events);

        transport.drop_session("NAVIGATION");

        assert_eq!(
            drain(&mut events),
            vec![TransportEvent::Disconnected("NAVIGATION".to_string())]
        );
        assert!(transport.send("operator", "hi").await.is_err());
    }

    #[tokio::test]
    async fn should_emit_auth_failure() {
        let transport = VirtualTransport::default();
        let mut events = transport.initialize().await.unwrap();
        drain(&mut events);

        transport.fail_auth("bad credentials");

        assert_eq!(
            drain(&mut events),
            vec![TransportEvent::AuthFailure("bad credentials".to_string())]
        );
        assert_eq!(transport.status().await.unwrap(), ConnectionState::AuthFailed);
    }

    #[tokio::test]
    async fn should_forget_session_when_destroyed() {
        let transport = VirtualTransport::default();
        let mut events = transport.initialize().await.unwrap();
        drain(&mut events);

        transport.destroy().await;

        assert!(matches!(
            transport.status().await,
            Err(TransportError::NotInitialized)
        ));
        assert!(events.recv().await.is_none());
    }
}
