//! Relay log port — append-only audit of applied toggles.

use std::future::Future;
use std::sync::Arc;

use relayhub_domain::error::HubError;
use relayhub_domain::relay::RelayLogEntry;

pub trait RelayLog {
    fn append(&self, entry: RelayLogEntry) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: RelayLog + Send + Sync> RelayLog for Arc<T> {
    fn append(&self, entry: RelayLogEntry) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).append(entry)
    }
}
