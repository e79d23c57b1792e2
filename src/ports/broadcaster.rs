//! Broadcaster port - the pub-sub transport boundary.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failures on the delivery side of the system.
///
/// None of these ever reach the caller of a mutation: they are logged by
/// the delivery path and the event is dropped.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("change queue is full")]
    QueueFull,

    #[error("change queue is closed")]
    QueueClosed,

    #[error("failed to encode change event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("broadcast transport failed: {0}")]
    Transport(String),

    #[error("broadcast timed out after {0:?}")]
    Timeout(Duration),
}

/// Publishes an encoded payload to every subscriber of a topic.
///
/// Fire-and-forget: implementations must not wait on individual
/// subscribers. A topic with no subscribers is not an error.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn publish_to_topic(&self, topic: &str, payload: Vec<u8>) -> Result<(), DeliveryError>;
}
