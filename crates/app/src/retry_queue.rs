//! Retry queue — strict FIFO of messages whose delivery failed with a
//! retryable error.
//!
//! A message that fails again during a drain goes back to the **head** and
//! the pass stops there, so later messages never overtake it.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use relayhub_domain::delivery::DeliveryOutcome;
use relayhub_domain::notification::QueuedMessage;
use serde::Serialize;

use crate::dispatcher::NotificationSender;

/// What one drain pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub delivered: usize,
    pub dropped: usize,
    /// The pass stopped on a retryable failure.
    pub requeued: bool,
    pub remaining: usize,
}

pub struct RetryQueue {
    messages: Mutex<VecDeque<QueuedMessage>>,
    drain_guard: tokio::sync::Mutex<()>,
    inter_message_delay: Duration,
}

impl RetryQueue {
    pub const DEFAULT_INTER_MESSAGE_DELAY: Duration = Duration::from_secs(2);
    const MIN_INTER_MESSAGE_DELAY: Duration = Duration::from_millis(1);

    /// `inter_message_delay` is the pause between two sends of one pass,
    /// clamped to at least 1 ms.
    #[must_use]
    pub fn new(inter_message_delay: Duration) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            drain_guard: tokio::sync::Mutex::new(()),
            inter_message_delay: inter_message_delay.max(Self::MIN_INTER_MESSAGE_DELAY),
        }
    }

    pub fn enqueue(&self, message: QueuedMessage) {
        let mut messages = self.lock();
        messages.push_back(message);
        tracing::info!(queue_length = messages.len(), "message queued for retry");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the queued messages, head first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<QueuedMessage> {
        self.lock().iter().cloned().collect()
    }

    /// Deliver queued messages in order until the queue is empty or a
    /// retryable failure blocks the head.
    ///
    /// Returns at once with an empty report when another pass is running.
    pub async fn drain_once<S: NotificationSender>(&self, sender: &S) -> DrainReport {
        let Ok(_guard) = self.drain_guard.try_lock() else {
            tracing::debug!("drain already in progress");
            return DrainReport {
                remaining: self.len(),
                ..DrainReport::default()
            };
        };

        let mut report = DrainReport::default();
        let mut first = true;
        loop {
            if !first {
                if self.is_empty() {
                    break;
                }
                tokio::time::sleep(self.inter_message_delay).await;
            }
            first = false;

            let Some(message) = self.lock().pop_front() else {
                break;
            };
            match sender.send(&message.recipient, &message.body).await {
                DeliveryOutcome::Delivered => {
                    tracing::info!(message_id = %message.id, "queued message delivered");
                    report.delivered += 1;
                }
                outcome if outcome.is_retryable() => {
                    tracing::info!(
                        message_id = %message.id,
                        reason = outcome.error().unwrap_or_default(),
                        "queued message still undeliverable, keeping it at the head"
                    );
                    self.lock().push_front(message);
                    report.requeued = true;
                    break;
                }
                outcome => {
                    tracing::error!(
                        message_id = %message.id,
                        reason = outcome.error().unwrap_or_default(),
                        "queued message failed permanently, dropping it"
                    );
                    report.dropped += 1;
                }
            }
        }

        report.remaining = self.len();
        if report.delivered > 0 || report.dropped > 0 {
            tracing::info!(
                delivered = report.delivered,
                dropped = report.dropped,
                remaining = report.remaining,
                "retry queue drained"
            );
        }
        report
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RetryQueue {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTER_MESSAGE_DELAY)
    }
}
