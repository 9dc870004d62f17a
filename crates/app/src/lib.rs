//! # relayhub-app
//!
//! Application layer — the automation engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ScheduleStore`, `RelayStore`, `RelayLog` — persistence
//!   - `MessagingTransport` — the stateful notification transport
//!   - `EventPublisher` — fire-and-forget fan-out to observers
//!   - `Clock` — wall-clock time of day
//! - Define the **driving/inbound port** `AutomationControl`, implemented by
//!   [`services::AutomationService`]
//! - Run the engine: schedule monitor, relay reconciliation, connection
//!   supervision, notification dispatch, retry queue and maintenance
//! - Provide **in-process infrastructure** (event bus, periodic scheduler)
//!
//! ## Dependency rule
//! Depends on `relayhub-domain` only (plus `tokio` for sync and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod event_bus;
pub mod maintenance;
pub mod notifications;
pub mod ports;
pub mod reconciler;
pub mod retry_queue;
pub mod schedule_monitor;
pub mod scheduler;
pub mod services;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testing;
