//! Event — an immutable record of something that happened.
//!
//! Events are fanned out to observers (the SSE stream, logs). Publishing is
//! fire-and-forget: nobody waits for an event to be consumed.

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionState;
use crate::id::{EventId, RelayId};
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    /// Stamp a payload with a fresh id and the current time.
    #[must_use]
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            timestamp: crate::time::now(),
            payload,
        }
    }

    /// Wire name of the payload variant, e.g. `relay_switched`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    QrChallenge {
        payload: String,
    },
    Authenticated,
    Ready,
    AuthFailure {
        reason: String,
    },
    Disconnected {
        reason: String,
    },
    ReconnectScheduled {
        attempt: u32,
        max_attempts: u32,
        delay_secs: u64,
    },
    /// The reconnect budget is spent; recovery needs a manual restart.
    ReconnectExhausted {
        attempts: u32,
    },
    TransportRestarting {
        delay_secs: u64,
    },
    /// Resync found the transport in a different state than believed.
    StatusUpdate {
        previous: ConnectionState,
        state: ConnectionState,
    },
    RelaySwitched {
        relay_id: RelayId,
        state: bool,
    },
    AutomationNotification {
        message: String,
        delivered: bool,
        error: Option<String>,
    },
}

impl EventPayload {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QrChallenge { .. } => "qr_challenge",
            Self::Authenticated => "authenticated",
            Self::Ready => "ready",
            Self::AuthFailure { .. } => "auth_failure",
            Self::Disconnected { .. } => "disconnected",
            Self::ReconnectScheduled { .. } => "reconnect_scheduled",
            Self::ReconnectExhausted { .. } => "reconnect_exhausted",
            Self::TransportRestarting { .. } => "transport_restarting",
            Self::StatusUpdate { .. } => "status_update",
            Self::RelaySwitched { .. } => "relay_switched",
            Self::AutomationNotification { .. } => "automation_notification",
        }
    }
}
