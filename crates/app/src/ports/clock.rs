//! Clock port.

use chrono::Local;
use relayhub_domain::time::{TimeOfDay, Timestamp};

/// Source of the current time.
///
/// Schedule windows are evaluated against the local wall clock, while
/// records are stamped in UTC.
pub trait Clock {
    fn now(&self) -> Timestamp;

    fn local_time(&self) -> TimeOfDay;
}

/// The host clock and timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        relayhub_domain::time::now()
    }

    fn local_time(&self) -> TimeOfDay {
        TimeOfDay::from(Local::now().time())
    }
}

impl<T: Clock> Clock for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn local_time(&self) -> TimeOfDay {
        (**self).local_time()
    }
}
