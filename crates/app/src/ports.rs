//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod clock;
pub mod control;
pub mod event_bus;
pub mod relay_log;
pub mod relay_store;
pub mod schedule_store;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use control::{AutomationControl, TransportStatus};
pub use event_bus::EventPublisher;
pub use relay_log::RelayLog;
pub use relay_store::RelayStore;
pub use schedule_store::ScheduleStore;
pub use transport::MessagingTransport;
