//! Recording broadcaster for testing.
//!
//! Stands in for the subscriber transport: stores every payload it is handed
//! and can be slowed down or made to fail.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if the lock is poisoned.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::notification::ChangeEnvelope;
use crate::ports::{Broadcaster, DeliveryError};

#[derive(Default)]
pub struct RecordingBroadcaster {
    delivered: RwLock<Vec<(String, Vec<u8>)>>,
    delay: Option<Duration>,
    failures_left: AtomicUsize,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every publish, like a congested transport.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the first `count` publishes with a transport error.
    pub fn failing_first(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    // === Test Helpers ===

    /// Raw `(topic, payload)` pairs in delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn delivered(&self) -> Vec<(String, Vec<u8>)> {
        self.delivered
            .read()
            .expect("RecordingBroadcaster: delivered lock poisoned")
            .clone()
    }

    pub fn topics(&self) -> Vec<String> {
        self.delivered().into_iter().map(|(topic, _)| topic).collect()
    }

    /// Delivered payloads decoded back into envelopes.
    ///
    /// # Panics
    ///
    /// Panics if a payload is not a valid envelope.
    pub fn envelopes(&self) -> Vec<ChangeEnvelope> {
        self.delivered()
            .iter()
            .map(|(_, payload)| {
                serde_json::from_slice(payload).expect("RecordingBroadcaster: invalid payload")
            })
            .collect()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered
            .read()
            .expect("RecordingBroadcaster: delivered lock poisoned")
            .len()
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn publish_to_topic(&self, topic: &str, payload: Vec<u8>) -> Result<(), DeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(DeliveryError::Transport("injected failure".to_string()));
        }

        self.delivered
            .write()
            .expect("RecordingBroadcaster: delivered write lock poisoned")
            .push((topic.to_string(), payload));
        Ok(())
    }
}
