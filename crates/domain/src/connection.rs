//! Connection lifecycle of the notification transport.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the messaging transport session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    #[default]
    Uninitialized,
    Connecting,
    Authenticated,
    Ready,
    Disconnected,
    AuthFailed,
}

impl ConnectionState {
    /// Whether messages may be handed to the transport in this state.
    ///
    /// An authenticated session is usable before the ready signal arrives.
    #[must_use]
    pub fn is_deliverable(self) -> bool {
        matches!(self, Self::Ready | Self::Authenticated)
    }

    /// Whether a disconnect signal in this state should enter
    /// [`Disconnected`](Self::Disconnected).
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Ready | Self::Authenticated | Self::Connecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Connecting => "CONNECTING",
            Self::Authenticated => "AUTHENTICATED",
            Self::Ready => "READY",
            Self::Disconnected => "DISCONNECTED",
            Self::AuthFailed => "AUTH_FAILED",
        })
    }
}

/// Signals emitted by a transport session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The session needs pairing; the payload is rendered for the operator.
    QrChallenge(String),
    Authenticated,
    Ready,
    AuthFailure(String),
    Disconnected(String),
}

/// Counts automatic reconnection attempts and computes backoff delays.
///
/// The delay before attempt `n` (1-based) is `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectBudget {
    attempts: u32,
    max: u32,
    base_delay: Duration,
}

impl ReconnectBudget {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(5);

    #[must_use]
    pub fn new(max: u32, base_delay: Duration) -> Self {
        Self {
            attempts: 0,
            max,
            base_delay,
        }
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max
    }

    /// Backoff delay before the given 1-based attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Consume one attempt and return `(attempt, delay)`, or `None` once
    /// the budget is spent.
    pub fn next_attempt(&mut self) -> Option<(u32, Duration)> {
        if self.is_exhausted() {
            return None;
        }
        self.attempts += 1;
        Some((self.attempts, self.delay_for(self.attempts)))
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl Default for ReconnectBudget {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BASE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_only_deliver_when_ready_or_authenticated() {
        assert!(ConnectionState::Ready.is_deliverable());
        assert!(ConnectionState::Authenticated.is_deliverable());
        for state in [
            ConnectionState::Uninitialized,
            ConnectionState::Connecting,
            ConnectionState::Disconnected,
            ConnectionState::AuthFailed,
        ] {
            assert!(!state.is_deliverable(), "{state}");
        }
    }

    #[test]
    fn should_grow_delay_linearly_with_attempt_number() {
        let mut budget = ReconnectBudget::default();
        let delays: Vec<u64> = std::iter::from_fn(|| budget.next_attempt())
            .map(|(_, d)| d.as_secs())
            .collect();
        assert_eq!(delays, vec![5, 10, 15, 20, 25]);
    }

    #[test]
    fn should_refuse_sixth_attempt() {
        let mut budget = ReconnectBudget::default();
        for _ in 0..5 {
            assert!(budget.next_attempt().is_some());
        }
        assert!(budget.is_exhausted());
        assert_eq!(budget.next_attempt(), None);
        assert_eq!(budget.attempts(), 5);
    }

    #[test]
    fn should_start_over_after_reset() {
        let mut budget = ReconnectBudget::new(2, Duration::from_secs(1));
        budget.next_attempt();
        budget.next_attempt();
        budget.reset();
        assert_eq!(budget.next_attempt(), Some((1, Duration::from_secs(1))));
    }

    #[test]
    fn should_serialize_state_in_screaming_case() {
        let json = serde_json::to_string(&ConnectionState::AuthFailed).unwrap();
        assert_eq!(json, "\"AUTH_FAILED\"");
        assert_eq!(ConnectionState::AuthFailed.to_string(), "AUTH_FAILED");
    }
}
