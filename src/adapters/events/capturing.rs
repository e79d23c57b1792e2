//! Capturing change publisher for testing.
//!
//! Records every envelope handed to it, synchronously and in order, so tests
//! can assert on exactly what a mutation announced.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if the lock is poisoned. Production wiring
//! uses the queued publisher in front of the delivery workers.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::notification::{ChangeEnvelope, NotificationType};
use crate::ports::ChangePublisher;

/// Change publisher that keeps everything it is given.
///
/// # Example
///
/// ```ignore
/// let publisher = Arc::new(CapturingPublisher::new());
/// services.delete_task(TaskId::new(10)).await?;
///
/// assert_eq!(publisher.event_count(), 1);
/// assert!(publisher.has_event(NotificationType::TaskDelete));
/// ```
#[derive(Default)]
pub struct CapturingPublisher {
    published: RwLock<Vec<ChangeEnvelope>>,
}

impl CapturingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Returns all published events.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn published_events(&self) -> Vec<ChangeEnvelope> {
        self.published
            .read()
            .expect("CapturingPublisher: published lock poisoned")
            .clone()
    }

    /// Returns events of a specific type.
    pub fn events_of_type(&self, notification_type: NotificationType) -> Vec<ChangeEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.notification_type() == notification_type)
            .collect()
    }

    /// Clears all published events (for test isolation).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn clear(&self) {
        self.published
            .write()
            .expect("CapturingPublisher: published write lock poisoned")
            .clear();
    }

    pub fn event_count(&self) -> usize {
        self.published
            .read()
            .expect("CapturingPublisher: published lock poisoned")
            .len()
    }

    pub fn has_event(&self, notification_type: NotificationType) -> bool {
        self.published
            .read()
            .expect("CapturingPublisher: published lock poisoned")
            .iter()
            .any(|e| e.notification_type() == notification_type)
    }
}

#[async_trait]
impl ChangePublisher for CapturingPublisher {
    async fn publish(&self, event: ChangeEnvelope) {
        self.published
            .write()
            .expect("CapturingPublisher: published write lock poisoned")
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::ChangeEvent;

    #[tokio::test]
    async fn captures_events_in_order() {
        let publisher = CapturingPublisher::new();

        publisher
            .publish(ChangeEvent::deleted(NotificationType::SessionDelete, 1i64))
            .await;
        publisher
            .publish(ChangeEvent::deleted(NotificationType::SessionRecordDelete, 2i64))
            .await;

        let events = publisher.published_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id(), Some(1));
        assert_eq!(events[1].id(), Some(2));
    }

    #[tokio::test]
    async fn filters_by_type() {
        let publisher = CapturingPublisher::new();
        publisher
            .publish(ChangeEvent::deleted(NotificationType::SessionDelete, 1i64))
            .await;

        assert!(publisher.has_event(NotificationType::SessionDelete));
        assert!(!publisher.has_event(NotificationType::TaskDelete));
        assert_eq!(
            publisher
                .events_of_type(NotificationType::SessionDelete)
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn clear_removes_all_events() {
        let publisher = CapturingPublisher::new();
        publisher
            .publish(ChangeEvent::deleted(NotificationType::SessionDelete, 1i64))
            .await;

        publisher.clear();

        assert_eq!(publisher.event_count(), 0);
    }
}
