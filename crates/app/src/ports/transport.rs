//! Messaging transport port — the stateful external channel notifications
//! are delivered through.
//!
//! A transport hosts at most one *session* at a time. [`initialize`] starts
//! a fresh session and hands back the stream of its lifecycle signals;
//! [`destroy`] tears the current session down. The stream closes when the
//! session goes away.
//!
//! [`initialize`]: MessagingTransport::initialize
//! [`destroy`]: MessagingTransport::destroy

use std::future::Future;

use relayhub_domain::connection::{ConnectionState, TransportEvent};
use relayhub_domain::error::TransportError;
use tokio::sync::mpsc;

pub trait MessagingTransport {
    /// Start a new session.
    fn initialize(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<TransportEvent>, TransportError>> + Send;

    /// Live state as reported by the transport itself.
    fn status(&self) -> impl Future<Output = Result<ConnectionState, TransportError>> + Send;

    /// Deliver one text message.
    fn send(
        &self,
        recipient: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Tear down the current session, if any.
    fn destroy(&self) -> impl Future<Output = ()> + Send;
}

impl<T: MessagingTransport + Send + Sync> MessagingTransport for std::sync::Arc<T> {
    fn initialize(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<TransportEvent>, TransportError>> + Send {
        (**self).initialize()
    }

    fn status(&self) -> impl Future<Output = Result<ConnectionState, TransportError>> + Send {
        (**self).status()
    }

    fn send(
        &self,
        recipient: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).send(recipient, body)
    }

    fn destroy(&self) -> impl Future<Output = ()> + Send {
        (**self).destroy()
    }
}
