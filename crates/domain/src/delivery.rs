//! Delivery policy — how a transport failure is classified.
//!
//! The policy is a plain ordered table ([`CLASSIFICATION_TABLE`]) matched
//! case-insensitively against the failure text. The first matching row
//! wins, so `"navigation timeout"` is a session failure even though it also
//! contains `"timeout"`.

use serde::{Deserialize, Serialize};

/// Why a delivery attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The supervisor did not consider the transport deliverable; the
    /// transport was not called.
    NotReady,
    /// The send did not complete within the dispatcher timeout.
    Timeout,
    /// The browser/session behind the transport broke.
    Session,
    /// A transient network condition.
    Transient,
    /// Anything unclassified; retrying will not help.
    Fatal,
}

impl FailureKind {
    #[must_use]
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Fatal)
    }

    /// Whether the failure means the session is gone and the supervisor
    /// should reconnect.
    #[must_use]
    pub fn triggers_reconnect(self) -> bool {
        matches!(self, Self::Session)
    }
}

/// One row of the classification policy.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub symptoms: &'static [&'static str],
    pub kind: FailureKind,
}

/// Ordered classification policy. Symptoms are lowercase.
pub const CLASSIFICATION_TABLE: &[ClassificationRule] = &[
    ClassificationRule {
        symptoms: &[
            "session closed",
            "protocol error",
            "target closed",
            "navigation timeout",
            "page crashed",
        ],
        kind: FailureKind::Session,
    },
    ClassificationRule {
        symptoms: &["timeout", "network", "connection reset", "econnreset"],
        kind: FailureKind::Transient,
    },
];

/// Classify a transport failure message.
#[must_use]
pub fn classify(message: &str) -> FailureKind {
    let message = message.to_lowercase();
    CLASSIFICATION_TABLE
        .iter()
        .find(|rule| rule.symptoms.iter().any(|s| message.contains(s)))
        .map_or(FailureKind::Fatal, |rule| rule.kind)
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Failed { kind: FailureKind, reason: String },
}

impl DeliveryOutcome {
    #[must_use]
    pub fn failed(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Delivered => false,
            Self::Failed { kind, .. } => kind.is_retryable(),
        }
    }

    #[must_use]
    pub fn triggers_reconnect(&self) -> bool {
        match self {
            Self::Delivered => false,
            Self::Failed { kind, .. } => kind.triggers_reconnect(),
        }
    }

    /// The failure reason, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Delivered => None,
            Self::Failed { reason, .. } => Some(reason),
        }
    }
}
