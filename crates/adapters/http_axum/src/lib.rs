//! # relayhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a small **JSON control API** over the `AutomationControl` port
//!   (`/api/schedules`, `/api/transport/*`, `/api/notifications`, …)
//! - Stream realtime engine events as **Server-Sent Events**
//!   (`/api/events/stream`)
//! - Map application errors into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `relayhub-app` (for port traits) and `relayhub-domain`
//! (for domain types used in request/response mapping). Never leaks axum
//! types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
