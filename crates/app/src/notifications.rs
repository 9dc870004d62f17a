//! Notification service — dispatch now, queue for later when the failure
//! is worth retrying.

use std::future::Future;
use std::sync::Arc;

use relayhub_domain::delivery::DeliveryOutcome;
use relayhub_domain::event::{Event, EventPayload};
use relayhub_domain::notification::{MessageCategory, Notification, QueuedMessage};

use crate::dispatcher::NotificationSender;
use crate::ports::EventPublisher;
use crate::retry_queue::RetryQueue;

/// Hands notifications to the delivery machinery.
pub trait Notifier {
    fn notify(&self, notification: Notification) -> impl Future<Output = DeliveryOutcome> + Send;
}

impl<N: Notifier + Send + Sync> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) -> impl Future<Output = DeliveryOutcome> + Send {
        (**self).notify(notification)
    }
}

pub struct NotificationService<D, P> {
    sender: D,
    queue: Arc<RetryQueue>,
    publisher: P,
}

impl<D, P> NotificationService<D, P>
where
    D: NotificationSender + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    pub fn new(sender: D, queue: Arc<RetryQueue>, publisher: P) -> Self {
        Self {
            sender,
            queue,
            publisher,
        }
    }

    /// Put a notification on the retry queue without trying to send it.
    pub fn enqueue(&self, notification: Notification) -> QueuedMessage {
        let queued = notification.into_queued(relayhub_domain::time::now());
        self.queue.enqueue(queued.clone());
        queued
    }

    /// Dispatch once; a retryable failure lands on the queue.
    ///
    /// Automation notifications are also broadcast with their outcome.
    pub async fn deliver(&self, notification: Notification) -> DeliveryOutcome {
        let outcome = self
            .sender
            .send(&notification.recipient, &notification.body)
            .await;

        if notification.category == MessageCategory::Automation {
            let event = Event::new(EventPayload::AutomationNotification {
                message: notification.body.clone(),
                delivered: outcome.is_delivered(),
                error: outcome.error().map(str::to_string),
            });
            let _ = self.publisher.publish(event).await;
        }

        if outcome.is_retryable() {
            tracing::info!(
                category = ?notification.category,
                reason = outcome.error().unwrap_or_default(),
                "notification will be retried later"
            );
            self.enqueue(notification);
        }
        outcome
    }
}

impl<D, P> Notifier for NotificationService<D, P>
where
    D: NotificationSender + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    fn notify(&self, notification: Notification) -> impl Future<Output = DeliveryOutcome> + Send {
        self.deliver(notification)
    }
}
