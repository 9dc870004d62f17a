//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! via `#[from]` / `From` impls.

/// Top-level error type crossing port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("transport error")]
    Transport(#[from] TransportError),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("relay id must be non-zero")]
    ZeroRelayId,

    #[error("invalid relay id `{0}`")]
    InvalidRelayId(String),

    #[error("invalid time of day `{0}`, expected HH:MM or HH:MM:SS")]
    InvalidTimeOfDay(String),

    #[error("recipient must not be empty")]
    EmptyRecipient,

    #[error("message body must not be empty")]
    EmptyBody,
}

/// A looked-up record does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A failure reported by the messaging transport.
///
/// The `Failure` text is the transport's own symptom description; the
/// delivery policy classifies it by substring (see [`crate::delivery`]).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("transport not initialized")]
    NotInitialized,

    #[error("{0}")]
    Failure(String),
}

impl TransportError {
    /// Build a [`TransportError::Failure`] from any message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}
