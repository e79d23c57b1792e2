//! Change delivery configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound on delivery workers accepted by validation.
pub const MAX_DELIVERY_WORKERS: usize = 5;

/// Settings for the delivery queue, its workers and the subscriber transport
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Number of delivery workers (1 to 5)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the bounded change queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long a mutation may wait for room in a full queue before the
    /// event is dropped
    #[serde(default = "default_enqueue_timeout")]
    pub enqueue_timeout_ms: u64,

    /// Upper bound on one handoff to the broadcaster
    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_ms: u64,

    /// Events buffered per subscriber before the oldest are dropped
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,

    /// Upper bound on one write to a subscriber socket
    #[serde(default = "default_subscriber_write_timeout")]
    pub subscriber_write_timeout_ms: u64,

    /// Topic all change events are published to
    #[serde(default = "default_topic")]
    pub topic: String,
}

impl DeliveryConfig {
    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_millis(self.enqueue_timeout_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn subscriber_write_timeout(&self) -> Duration {
        Duration::from_millis(self.subscriber_write_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.workers == 0 || self.workers > MAX_DELIVERY_WORKERS {
            return Err(ValidationError::InvalidWorkerCount {
                actual: self.workers,
                max: MAX_DELIVERY_WORKERS,
            });
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::ZeroDeliverySetting("queue_capacity"));
        }
        if self.publish_timeout_ms == 0 {
            return Err(ValidationError::ZeroDeliverySetting("publish_timeout_ms"));
        }
        if self.subscriber_buffer == 0 {
            return Err(ValidationError::ZeroDeliverySetting("subscriber_buffer"));
        }
        if self.subscriber_write_timeout_ms == 0 {
            return Err(ValidationError::ZeroDeliverySetting(
                "subscriber_write_timeout_ms",
            ));
        }
        if self.topic.trim().is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        Ok(())
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            enqueue_timeout_ms: default_enqueue_timeout(),
            publish_timeout_ms: default_publish_timeout(),
            subscriber_buffer: default_subscriber_buffer(),
            subscriber_write_timeout_ms: default_subscriber_write_timeout(),
            topic: default_topic(),
        }
    }
}

fn default_workers() -> usize {
    3
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_enqueue_timeout() -> u64 {
    25
}

fn default_publish_timeout() -> u64 {
    1000
}

fn default_subscriber_buffer() -> usize {
    256
}

fn default_subscriber_write_timeout() -> u64 {
    2000
}

fn default_topic() -> String {
    "changes".to_string()
}
