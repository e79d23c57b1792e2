//! QueuedChangePublisher - the producer side of the delivery queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::SendTimeoutError};

use crate::domain::notification::ChangeEnvelope;
use crate::ports::{ChangePublisher, DeliveryError};

use super::delivery_pool::{DeliveryStats, DeliveryStatsSnapshot};

/// Enqueues change events for the delivery workers.
///
/// Created by [`DeliveryWorkerPool::start`](super::DeliveryWorkerPool::start).
/// Cheap to clone; every clone feeds the same queue.
#[derive(Clone)]
pub struct QueuedChangePublisher {
    sender: mpsc::Sender<ChangeEnvelope>,
    enqueue_timeout: Duration,
    stats: Arc<DeliveryStats>,
}

impl QueuedChangePublisher {
    pub(super) fn new(
        sender: mpsc::Sender<ChangeEnvelope>,
        enqueue_timeout: Duration,
        stats: Arc<DeliveryStats>,
    ) -> Self {
        Self {
            sender,
            enqueue_timeout,
            stats,
        }
    }

    /// Enqueue `event`, waiting at most `enqueue_timeout` for room.
    pub async fn enqueue(&self, event: ChangeEnvelope) -> Result<(), DeliveryError> {
        match self.sender.send_timeout(event, self.enqueue_timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(DeliveryError::QueueFull),
            Err(SendTimeoutError::Closed(_)) => Err(DeliveryError::QueueClosed),
        }
    }

    pub fn stats(&self) -> DeliveryStatsSnapshot {
        self.stats.snapshot()
    }
}

#[async_trait]
impl ChangePublisher for QueuedChangePublisher {
    async fn publish(&self, event: ChangeEnvelope) {
        let notification_type = event.notification_type();
        let id = event.id();

        match self.enqueue(event).await {
            Ok(()) => self.stats.record_enqueued(),
            Err(error) => {
                self.stats.record_dropped();
                tracing::warn!(
                    %notification_type,
                    id = ?id,
                    %error,
                    "Dropping change event"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::{ChangeEvent, NotificationType};

    fn publisher(capacity: usize) -> (QueuedChangePublisher, mpsc::Receiver<ChangeEnvelope>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let publisher = QueuedChangePublisher::new(
            sender,
            Duration::from_millis(10),
            Arc::new(DeliveryStats::default()),
        );
        (publisher, receiver)
    }

    fn event(id: i64) -> ChangeEnvelope {
        ChangeEvent::deleted(NotificationType::SessionRecordDelete, id)
    }

    #[tokio::test]
    async fn full_queue_drops_after_enqueue_timeout() {
        let (publisher, _receiver) = publisher(1);

        publisher.publish(event(1)).await;
        publisher.publish(event(2)).await;

        let stats = publisher.stats();
        assert_eq!(stats.enqueued, 1);
        assert_eq!(stats.dropped, 1);
    }

    #[tokio::test]
    async fn enqueue_reports_queue_state() {
        let (publisher, receiver) = publisher(1);

        assert!(publisher.enqueue(event(1)).await.is_ok());
        assert!(matches!(
            publisher.enqueue(event(2)).await,
            Err(DeliveryError::QueueFull)
        ));

        drop(receiver);
        assert!(matches!(
            publisher.enqueue(event(3)).await,
            Err(DeliveryError::QueueClosed)
        ));
    }

    #[tokio::test]
    async fn enqueued_events_keep_submission_order() {
        let (publisher, mut receiver) = publisher(8);

        for id in 1..=3 {
            publisher.publish(event(id)).await;
        }

        for expected in 1..=3 {
            assert_eq!(receiver.recv().await.unwrap().id(), Some(expected));
        }
    }
}
