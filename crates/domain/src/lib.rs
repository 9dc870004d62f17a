//! # relayhub-domain
//!
//! Pure domain model for the relayhub relay automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps,
//!   times of day
//! - Define **Schedules** (daily on-windows for a relay) and the window math
//! - Define **Relays** (observations, toggle commands, audit log entries)
//! - Define the notification transport's **connection states** and the
//!   reconnect budget
//! - Define the **delivery policy** (how transport failures are classified)
//! - Define **Notifications** and **Events** surfaced to observers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod connection;
pub mod delivery;
pub mod event;
pub mod notification;
pub mod relay;
pub mod schedule;
pub mod window;
