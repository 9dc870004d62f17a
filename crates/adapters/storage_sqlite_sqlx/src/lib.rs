//! # relayhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `ScheduleStore`, `RelayStore` and `RelayLog` ports defined in `relayhub-app`
//! - Manage `SQLite` connection pool lifecycle
//! - Run the embedded migrations
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `relayhub-app` (for port traits) and `relayhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod pool;
mod relay_log_repo;
mod relay_repo;
mod rows;
mod schedule_repo;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use relay_log_repo::SqliteRelayLog;
pub use relay_repo::SqliteRelayStore;
pub use schedule_repo::SqliteScheduleStore;
