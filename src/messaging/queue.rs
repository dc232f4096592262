//! # Message Queue Contract
//!
//! Enqueue side: [`MessageQueue::send_batch`], capped at the provider's
//! ten-message batch limit. Consume side: the queue runtime hands the
//! worker a slice of [`QueueDelivery`] records and receives a
//! [`BatchConsumeReport`] back; only the identifiers reported failed are
//! redelivered, and the provider dead-letters a message after the
//! configured attempt count.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::{MessagingError, MessagingResult};
use super::message::QueueMessage;
use crate::constants::MAX_QUEUE_BATCH_SIZE;

/// Durable at-least-once queue, enqueue side.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueue up to [`MAX_QUEUE_BATCH_SIZE`] messages in one call.
    async fn send_batch(&self, messages: &[QueueMessage]) -> MessagingResult<()>;

    /// Enqueue a single message.
    async fn send(&self, message: &QueueMessage) -> MessagingResult<()> {
        self.send_batch(std::slice::from_ref(message)).await
    }
}

/// One message as delivered to a consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueDelivery {
    /// Queue-assigned identifier used in failure reports
    pub message_id: String,
    /// Raw JSON body
    pub body: String,
    /// Delivery attempt number, starting at 1
    pub receive_count: u32,
}

impl QueueDelivery {
    pub fn new(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            body: body.into(),
            receive_count: 1,
        }
    }

    /// Decode the body into the message union.
    pub fn parse(&self) -> MessagingResult<QueueMessage> {
        QueueMessage::from_body(&self.body)
    }
}

/// Per-item consumption outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeItemOutcome {
    pub message_id: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Consumer report for one delivered batch. Never an all-or-nothing ack:
/// the queue redelivers exactly the items listed as failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConsumeReport {
    pub items: Vec<ConsumeItemOutcome>,
}

impl BatchConsumeReport {
    pub fn record_success(&mut self, message_id: impl Into<String>) {
        self.items.push(ConsumeItemOutcome {
            message_id: message_id.into(),
            success: true,
            error: None,
        });
    }

    pub fn record_failure(&mut self, message_id: impl Into<String>, error: impl Into<String>) {
        self.items.push(ConsumeItemOutcome {
            message_id: message_id.into(),
            success: false,
            error: Some(error.into()),
        });
    }

    /// Identifiers the queue should redeliver.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| !item.success)
            .map(|item| item.message_id.as_str())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.items.iter().all(|item| item.success)
    }
}

/// In-memory queue double for tests and local development.
///
/// Enqueued messages are serialized to their wire bodies immediately, so
/// consumers exercise the same parse path they would against the real
/// provider.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    deliveries: Mutex<VecDeque<QueueDelivery>>,
    next_id: AtomicU64,
    batch_calls: AtomicUsize,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop up to `limit` deliveries for a consumer poll.
    pub fn receive(&self, limit: usize) -> Vec<QueueDelivery> {
        let mut deliveries = self.deliveries.lock();
        let take = limit.min(deliveries.len());
        deliveries.drain(..take).collect()
    }

    /// Push a delivery back as the queue would after a reported failure.
    pub fn redeliver(&self, mut delivery: QueueDelivery) {
        delivery.receive_count += 1;
        self.deliveries.lock().push_back(delivery);
    }

    pub fn len(&self) -> usize {
        self.deliveries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.lock().is_empty()
    }

    /// Number of send_batch calls accepted so far.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn send_batch(&self, messages: &[QueueMessage]) -> MessagingResult<()> {
        if messages.len() > MAX_QUEUE_BATCH_SIZE {
            return Err(MessagingError::batch_too_large(messages.len()));
        }

        let mut bodies = Vec::with_capacity(messages.len());
        for message in messages {
            bodies.push(message.to_body()?);
        }

        let mut deliveries = self.deliveries.lock();
        for body in bodies {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            deliveries.push_back(QueueDelivery::new(format!("msg-{id}"), body));
        }
        self.batch_calls.fetch_add(1, Ordering::SeqCst);

        debug!(batch_size = messages.len(), "Enqueued message batch");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_size_limit_enforced() {
        let queue = InMemoryQueue::new();
        let messages: Vec<QueueMessage> = (0..11)
            .map(|i| QueueMessage::manual(format!("+1212555{i:04}"), "hi", None))
            .collect();

        let err = queue.send_batch(&messages).await.unwrap_err();
        assert!(matches!(err, MessagingError::BatchTooLarge { size: 11, .. }));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_enqueued_messages_round_trip() {
        let queue = InMemoryQueue::new();
        let message = QueueMessage::campaign("+12128675309", "Hi", "camp-1", "+12128675309");
        queue.send_batch(std::slice::from_ref(&message)).await.unwrap();

        let deliveries = queue.receive(10);
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].receive_count, 1);
        assert_eq!(deliveries[0].parse().unwrap(), message);
    }

    #[tokio::test]
    async fn test_redelivery_bumps_receive_count() {
        let queue = InMemoryQueue::new();
        queue
            .send(&QueueMessage::manual("+12128675309", "hi", None))
            .await
            .unwrap();

        let delivery = queue.receive(1).remove(0);
        queue.redeliver(delivery);
        let redelivered = queue.receive(1).remove(0);
        assert_eq!(redelivered.receive_count, 2);
    }

    #[test]
    fn test_report_failed_ids() {
        let mut report = BatchConsumeReport::default();
        report.record_success("msg-1");
        report.record_failure("msg-2", "gateway down");
        report.record_success("msg-3");

        assert_eq!(report.failed_ids(), vec!["msg-2"]);
        assert!(!report.all_succeeded());
    }
}
