//! Relay store port — the persisted power state of each relay channel.

use std::future::Future;
use std::sync::Arc;

use relayhub_domain::error::HubError;
use relayhub_domain::id::RelayId;
use relayhub_domain::relay::RelayObservation;

pub trait RelayStore {
    /// Current state of a relay.
    ///
    /// Returns a `NotFound` error for an unknown relay.
    fn get_state(&self, relay_id: RelayId) -> impl Future<Output = Result<bool, HubError>> + Send;

    /// Set the state of a relay, creating the row if needed.
    fn set_state(
        &self,
        relay_id: RelayId,
        state: bool,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    fn list(&self) -> impl Future<Output = Result<Vec<RelayObservation>, HubError>> + Send;
}

impl<T: RelayStore + Send + Sync> RelayStore for Arc<T> {
    fn get_state(&self, relay_id: RelayId) -> impl Future<Output = Result<bool, HubError>> + Send {
        (**self).get_state(relay_id)
    }

    fn set_state(
        &self,
        relay_id: RelayId,
        state: bool,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).set_state(relay_id, state)
    }

    fn list(&self) -> impl Future<Output = Result<Vec<RelayObservation>, HubError>> + Send {
        (**self).list()
    }
}
