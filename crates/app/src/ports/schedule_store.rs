//! Schedule store port.

use std::future::Future;
use std::sync::Arc;

use relayhub_domain::error::HubError;
use relayhub_domain::id::RelayId;
use relayhub_domain::schedule::Schedule;

/// Persistence for [`Schedule`]s. At most one schedule exists per relay.
pub trait ScheduleStore {
    /// Schedules with `is_active` set, the set evaluated on every tick.
    fn list_active(&self) -> impl Future<Output = Result<Vec<Schedule>, HubError>> + Send;

    fn list_all(&self) -> impl Future<Output = Result<Vec<Schedule>, HubError>> + Send;

    /// Insert or replace the schedule of `schedule.relay_id`.
    ///
    /// When a schedule already exists for the relay its id is kept.
    fn upsert(&self, schedule: Schedule) -> impl Future<Output = Result<Schedule, HubError>> + Send;

    /// Remove the schedule of a relay. Unknown relays are a `NotFound` error.
    fn delete(&self, relay_id: RelayId) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: ScheduleStore + Send + Sync> ScheduleStore for Arc<T> {
    fn list_active(&self) -> impl Future<Output = Result<Vec<Schedule>, HubError>> + Send {
        (**self).list_active()
    }

    fn list_all(&self) -> impl Future<Output = Result<Vec<Schedule>, HubError>> + Send {
        (**self).list_all()
    }

    fn upsert(&self, schedule: Schedule) -> impl Future<Output = Result<Schedule, HubError>> + Send {
        (**self).upsert(schedule)
    }

    fn delete(&self, relay_id: RelayId) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).delete(relay_id)
    }
}
