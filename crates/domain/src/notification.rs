//! Outbound notifications and the messages waiting in the retry queue.

use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};
use crate::id::{MessageId, RelayId};
use crate::time::{TimeOfDay, Timestamp};
use crate::window::TimeWindow;

/// Where a notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Automation,
    Manual,
    Test,
}

/// A message addressed to one recipient, before any delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub body: String,
    pub category: MessageCategory,
}

impl Notification {
    /// # Errors
    ///
    /// Returns a validation error when the recipient or body is blank.
    pub fn new(
        recipient: impl Into<String>,
        body: impl Into<String>,
        category: MessageCategory,
    ) -> Result<Self, HubError> {
        let recipient = recipient.into();
        let body = body.into();
        if recipient.trim().is_empty() {
            return Err(ValidationError::EmptyRecipient.into());
        }
        if body.trim().is_empty() {
            return Err(ValidationError::EmptyBody.into());
        }
        Ok(Self {
            recipient,
            body,
            category,
        })
    }

    /// The operator message sent when automation powers a relay down
    /// outside its window.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the recipient is blank.
    pub fn relay_switched_off(
        recipient: impl Into<String>,
        relay_id: RelayId,
        local_time: TimeOfDay,
        window: TimeWindow,
    ) -> Result<Self, HubError> {
        let body = format!(
            "AUTOMATIC NOTIFICATION\n\n\
             Relay channel {relay_id} was switched off automatically because it is outside its operating hours.\n\n\
             Time: {local_time}\n\
             Operating hours: {window}\n\
             Status: system running normally\n\n\
             Automated message from RelayHub"
        );
        Self::new(recipient, body, MessageCategory::Automation)
    }

    /// # Errors
    ///
    /// Returns a validation error when the recipient is blank.
    pub fn test_message(recipient: impl Into<String>, local_time: TimeOfDay) -> Result<Self, HubError> {
        let body = format!(
            "TEST NOTIFICATION\n\nRelayHub notification delivery is working.\n\nTime: {local_time}"
        );
        Self::new(recipient, body, MessageCategory::Test)
    }

    /// Wrap the notification for the retry queue.
    #[must_use]
    pub fn into_queued(self, enqueued_at: Timestamp) -> QueuedMessage {
        QueuedMessage {
            id: MessageId::new(),
            recipient: self.recipient,
            body: self.body,
            enqueued_at,
            category: self.category,
        }
    }
}

/// A message waiting in the retry queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: MessageId,
    pub recipient: String,
    pub body: String,
    pub enqueued_at: Timestamp,
    pub category: MessageCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn should_reject_blank_recipient() {
        let result = Notification::new("  ", "hello", MessageCategory::Manual);
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::EmptyRecipient))
        ));
    }

    #[test]
    fn should_reject_blank_body() {
        let result = Notification::new("operator", "", MessageCategory::Manual);
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::EmptyBody))
        ));
    }

    #[test]
    fn should_describe_relay_channel_time_and_window_when_switched_off() {
        let n = Notification::relay_switched_off(
            "operator",
            RelayId::new(3).unwrap(),
            t("18:00:00"),
            TimeWindow::new(t("07:00"), t("17:00")),
        )
        .unwrap();
        assert_eq!(n.category, MessageCategory::Automation);
        assert!(n.body.contains("Relay channel 3"));
        assert!(n.body.contains("Time: 18:00:00"));
        assert!(n.body.contains("Operating hours: 07:00 - 17:00"));
        assert!(n.body.contains("Status: system running normally"));
    }

    #[test]
    fn should_keep_content_when_queued() {
        let n = Notification::test_message("operator", t("09:30")).unwrap();
        let at = crate::time::now();
        let queued = n.clone().into_queued(at);
        assert_eq!(queued.recipient, n.recipient);
        assert_eq!(queued.body, n.body);
        assert_eq!(queued.category, MessageCategory::Test);
        assert_eq!(queued.enqueued_at, at);
    }
}
