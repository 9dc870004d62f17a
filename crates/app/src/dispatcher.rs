//! Notification dispatcher — one delivery attempt through the transport.
//!
//! The dispatcher never queues anything itself: it returns a
//! [`DeliveryOutcome`] and leaves retrying to its caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use relayhub_domain::delivery::{DeliveryOutcome, FailureKind, classify};
use relayhub_domain::error::TransportError;

use crate::ports::{EventPublisher, MessagingTransport};
use crate::supervisor::ConnectionSupervisor;

/// Anything that can attempt to deliver a message.
pub trait NotificationSender {
    fn send(&self, recipient: &str, body: &str) -> impl Future<Output = DeliveryOutcome> + Send;
}

impl<S: NotificationSender + Send + Sync> NotificationSender for Arc<S> {
    fn send(&self, recipient: &str, body: &str) -> impl Future<Output = DeliveryOutcome> + Send {
        (**self).send(recipient, body)
    }
}

pub struct Dispatcher<T, P> {
    supervisor: Arc<ConnectionSupervisor<T, P>>,
    timeout: Duration,
}

impl<T, P> Dispatcher<T, P>
where
    T: MessagingTransport + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

    #[must_use]
    pub fn new(supervisor: Arc<ConnectionSupervisor<T, P>>, timeout: Duration) -> Self {
        Self {
            supervisor,
            timeout,
        }
    }

    /// Attempt one delivery.
    ///
    /// Session failures are reported to the supervisor before returning.
    #[tracing::instrument(skip(self, body))]
    pub async fn dispatch(&self, recipient: &str, body: &str) -> DeliveryOutcome {
        let state = self.supervisor.state();
        if !state.is_deliverable() {
            tracing::debug!("transport not deliverable, not sending");
            return DeliveryOutcome::failed(
                FailureKind::NotReady,
                format!("transport not ready ({state})"),
            );
        }

        let sending = self.supervisor.transport().send(recipient, body);
        let outcome = match tokio::time::timeout(self.timeout, sending).await {
            Ok(Ok(())) => DeliveryOutcome::Delivered,
            Err(_) => DeliveryOutcome::failed(
                FailureKind::Timeout,
                format!("message timeout after {} seconds", self.timeout.as_secs()),
            ),
            Ok(Err(TransportError::NotInitialized)) => DeliveryOutcome::failed(
                FailureKind::NotReady,
                TransportError::NotInitialized.to_string(),
            ),
            Ok(Err(err)) => {
                let reason = err.to_string();
                DeliveryOutcome::failed(classify(&reason), reason)
            }
        };

        match &outcome {
            DeliveryOutcome::Delivered => tracing::info!("message delivered"),
            DeliveryOutcome::Failed { kind, reason } => {
                tracing::warn!(?kind, %reason, "message delivery failed");
                if kind.triggers_reconnect() {
                    self.supervisor.report_session_failure(reason.clone()).await;
                }
            }
        }
        outcome
    }
}

impl<T, P> NotificationSender for Dispatcher<T, P>
where
    T: MessagingTransport + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    fn send(&self, recipient: &str, body: &str) -> impl Future<Output = DeliveryOutcome> + Send {
        self.dispatch(recipient, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::SupervisorConfig;
    use crate::testing::{FakeTransport, SpyPublisher, settle};
    use relayhub_domain::connection::{ConnectionState, TransportEvent};

    type TestDispatcher = Dispatcher<Arc<FakeTransport>, Arc<SpyPublisher>>;
    type TestSupervisor = ConnectionSupervisor<Arc<FakeTransport>, Arc<SpyPublisher>>;

    async fn make_dispatcher(
        ready: bool,
    ) -> (TestDispatcher, Arc<TestSupervisor>, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::default());
        let supervisor = Arc::new(ConnectionSupervisor::new(
            Arc::clone(&transport),
            Arc::new(SpyPublisher::default()),
            SupervisorConfig::default(),
        ));
        supervisor.start().await;
        if ready {
            transport.emit(TransportEvent::Ready);
            settle().await;
        }
        let dispatcher = Dispatcher::new(Arc::clone(&supervisor), Duration::from_secs(45));
        (dispatcher, supervisor, transport)
    }

    fn kind_of(outcome: &DeliveryOutcome) -> Option<FailureKind> {
        match outcome {
            DeliveryOutcome::Delivered => None,
            DeliveryOutcome::Failed { kind, .. } => Some(*kind),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_deliver_when_ready() {
        let (dispatcher, _, transport) = make_dispatcher(true).await;

        let outcome = dispatcher.dispatch("operator", "hello").await;

        assert!(outcome.is_delivered());
        assert_eq!(
            transport.delivered(),
            vec![("operator".to_string(), "hello".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_fail_fast_without_calling_transport_when_not_ready() {
        let (dispatcher, _, transport) = make_dispatcher(false).await;

        let outcome = dispatcher.dispatch("operator", "hello").await;

        assert_eq!(kind_of(&outcome), Some(FailureKind::NotReady));
        assert!(outcome.is_retryable());
        assert_eq!(transport.send_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_time_out_as_retryable_without_reconnect() {
        let (dispatcher, supervisor, transport) = make_dispatcher(true).await;
        transport.hang_sends();

        let outcome = dispatcher.dispatch("operator", "hello").await;

        assert_eq!(kind_of(&outcome), Some(FailureKind::Timeout));
        assert_eq!(outcome.error(), Some("message timeout after 45 seconds"));
        assert!(outcome.is_retryable());
        assert_eq!(supervisor.state(), ConnectionState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_session_failure_to_supervisor() {
        let (dispatcher, supervisor, transport) = make_dispatcher(true).await;
        transport.push_send_result(Err(TransportError::failure(
            "Protocol error (Runtime.callFunctionOn): Session closed.",
        )));

        let outcome = dispatcher.dispatch("operator", "hello").await;

        assert_eq!(kind_of(&outcome), Some(FailureKind::Session));
        assert!(outcome.is_retryable());
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
        assert_eq!(supervisor.snapshot().attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_state_on_transient_failure() {
        let (dispatcher, supervisor, transport) = make_dispatcher(true).await;
        transport.push_send_result(Err(TransportError::failure("read ECONNRESET")));

        let outcome = dispatcher.dispatch("operator", "hello").await;

        assert_eq!(kind_of(&outcome), Some(FailureKind::Transient));
        assert_eq!(supervisor.state(), ConnectionState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn should_classify_unknown_failure_as_fatal() {
        let (dispatcher, supervisor, transport) = make_dispatcher(true).await;
        transport.push_send_result(Err(TransportError::failure("invalid wid")));

        let outcome = dispatcher.dispatch("operator", "hello").await;

        assert_eq!(kind_of(&outcome), Some(FailureKind::Fatal));
        assert!(!outcome.is_retryable());
        assert_eq!(supervisor.state(), ConnectionState::Ready);
    }
}
