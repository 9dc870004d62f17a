//! Relay — observations, toggle commands and audit log rows.

use serde::{Deserialize, Serialize};

use crate::id::RelayId;
use crate::time::Timestamp;

/// Current power state of a relay as read from the store.
///
/// Always re-fetched before a reconciliation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayObservation {
    pub relay_id: RelayId,
    pub current_state: bool,
}

/// An intent to set a relay to `target`, produced by reconciliation.
///
/// The caller applies it to the relay store and appends its
/// [`audit_entry`](Self::audit_entry) to the relay log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleCommand {
    pub relay_id: RelayId,
    pub previous: bool,
    pub target: bool,
    pub decided_at: Timestamp,
}

impl ToggleCommand {
    /// Only automatic power-down is reported to operators; power-up is silent.
    #[must_use]
    pub fn is_notifiable(&self) -> bool {
        self.previous && !self.target
    }

    /// The append-only log row recording this transition.
    #[must_use]
    pub fn audit_entry(&self) -> RelayLogEntry {
        RelayLogEntry {
            relay_id: self.relay_id,
            state: self.target,
            at: self.decided_at,
        }
    }
}

/// One row of the append-only relay log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayLogEntry {
    pub relay_id: RelayId,
    pub state: bool,
    pub at: Timestamp,
}

/// Render a relay state the way operators read it.
#[must_use]
pub fn state_label(state: bool) -> &'static str {
    if state { "ON" } else { "OFF" }
}
