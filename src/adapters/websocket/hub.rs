//! Topic-based fan-out to WebSocket subscribers.
//!
//! Each topic owns a `tokio::sync::broadcast` channel. Publishing never
//! waits on a subscriber: a subscriber that falls more than the buffer size
//! behind loses the oldest events and is told so on its next receive.
//!
//! # Architecture
//!
//! ```text
//! Topic: changes
//! ├── client-a
//! ├── client-b
//! └── client-c
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::config::DeliveryConfig;
use crate::ports::{Broadcaster, DeliveryError};

/// Unique identifier for a subscriber connection.
///
/// Generated server-side when a client connects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Topic senders and the topic each client joined.
///
/// Both maps live under one lock so join and leave always see them
/// consistent.
#[derive(Default)]
struct Registry {
    /// Map of topic → broadcast sender for that topic.
    topics: HashMap<String, broadcast::Sender<Arc<str>>>,

    /// Map of client_id → topic for cleanup on disconnect.
    client_topics: HashMap<ClientId, String>,
}

/// Registry of topics and the subscribers listening on them.
///
/// # Thread Safety
///
/// Uses a single `RwLock` for the registry since publishes (reads) vastly
/// outnumber joins and leaves (writes).
pub struct SubscriberHub {
    registry: RwLock<Registry>,

    /// Per-subscriber buffer before the oldest events are dropped.
    channel_capacity: usize,

    /// Upper bound on any single write to a subscriber socket.
    write_timeout: Duration,
}

impl SubscriberHub {
    pub fn new(channel_capacity: usize, write_timeout: Duration) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            channel_capacity: channel_capacity.max(1),
            write_timeout,
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self::new(config.subscriber_buffer, config.subscriber_write_timeout())
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Join a client to a topic, creating the topic on first use.
    pub async fn join(&self, topic: &str, client_id: ClientId) -> broadcast::Receiver<Arc<str>> {
        let mut registry = self.registry.write().await;
        let capacity = self.channel_capacity;

        let receiver = registry
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe();
        registry.client_topics.insert(client_id, topic.to_string());

        receiver
    }

    /// Remove a client, dropping its topic once nobody listens to it.
    ///
    /// The client's receiver must already be dropped for the topic to be
    /// considered empty.
    pub async fn leave(&self, client_id: &ClientId) {
        let mut registry = self.registry.write().await;

        if let Some(topic) = registry.client_topics.remove(client_id) {
            let empty = registry
                .topics
                .get(&topic)
                .map(|sender| sender.receiver_count() == 0)
                .unwrap_or(false);
            if empty {
                registry.topics.remove(&topic);
            }
        }
    }

    /// Send `payload` to every current subscriber of `topic`.
    ///
    /// Returns the number of subscribers it was queued for. A topic without
    /// subscribers is a no-op.
    pub async fn publish(&self, topic: &str, payload: Arc<str>) -> usize {
        let registry = self.registry.read().await;

        match registry.topics.get(topic) {
            // Err only means there are no receivers
            Some(sender) => sender.send(payload).unwrap_or(0),
            None => 0,
        }
    }

    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let registry = self.registry.read().await;
        registry
            .topics
            .get(topic)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    pub async fn active_topics(&self) -> Vec<String> {
        self.registry.read().await.topics.keys().cloned().collect()
    }

    pub async fn total_client_count(&self) -> usize {
        self.registry.read().await.client_topics.len()
    }
}

#[async_trait]
impl Broadcaster for SubscriberHub {
    async fn publish_to_topic(&self, topic: &str, payload: Vec<u8>) -> Result<(), DeliveryError> {
        let text = String::from_utf8(payload)
            .map_err(|e| DeliveryError::Transport(format!("payload is not UTF-8: {e}")))?;
        let receivers = self.publish(topic, Arc::from(text)).await;
        tracing::trace!(topic, receivers, "Broadcast change event");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    fn hub(capacity: usize) -> SubscriberHub {
        SubscriberHub::new(capacity, Duration::from_millis(100))
    }

    #[tokio::test]
    async fn join_creates_topic_if_not_exists() {
        let hub = hub(8);

        let _rx = hub.join("changes", ClientId::new()).await;

        assert_eq!(hub.active_topics().await, vec!["changes".to_string()]);
    }

    #[tokio::test]
    async fn every_subscriber_receives_payload() {
        let hub = hub(8);
        let mut rx1 = hub.join("changes", ClientId::new()).await;
        let mut rx2 = hub.join("changes", ClientId::new()).await;

        let receivers = hub.publish("changes", Arc::from("{}")).await;

        assert_eq!(receivers, 2);
        assert_eq!(&*rx1.recv().await.unwrap(), "{}");
        assert_eq!(&*rx2.recv().await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let hub = hub(8);
        let mut changes = hub.join("changes", ClientId::new()).await;
        let mut other = hub.join("other", ClientId::new()).await;

        hub.publish("changes", Arc::from("a")).await;

        assert_eq!(&*changes.recv().await.unwrap(), "a");
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_noop() {
        let hub = hub(8);
        assert_eq!(hub.publish("changes", Arc::from("a")).await, 0);
        assert!(hub.publish_to_topic("changes", b"a".to_vec()).await.is_ok());
    }

    #[tokio::test]
    async fn lagging_subscriber_loses_oldest_events() {
        let hub = hub(2);
        let mut rx = hub.join("changes", ClientId::new()).await;

        for n in 0..5 {
            hub.publish("changes", Arc::from(n.to_string())).await;
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(&*rx.recv().await.unwrap(), "3");
        assert_eq!(&*rx.recv().await.unwrap(), "4");
    }

    #[tokio::test]
    async fn leave_cleans_up_empty_topic() {
        let hub = hub(8);
        let client_id = ClientId::new();

        {
            let _rx = hub.join("changes", client_id.clone()).await;
        }
        hub.leave(&client_id).await;

        assert!(hub.active_topics().await.is_empty());
        assert_eq!(hub.total_client_count().await, 0);
    }

    #[tokio::test]
    async fn leave_keeps_topic_with_remaining_subscribers() {
        let hub = hub(8);
        let leaving = ClientId::new();
        let _stay = hub.join("changes", ClientId::new()).await;
        {
            let _rx = hub.join("changes", leaving.clone()).await;
        }

        hub.leave(&leaving).await;

        assert_eq!(hub.subscriber_count("changes").await, 1);
    }

    #[tokio::test]
    async fn non_utf8_payload_is_a_transport_error() {
        let hub = hub(8);
        let result = hub.publish_to_topic("changes", vec![0xff, 0xfe]).await;
        assert!(matches!(result, Err(DeliveryError::Transport(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_join_and_leave_make_progress() {
        let hub = Arc::new(hub(8));

        let churn = (0..8).map(|_| {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                for _ in 0..500 {
                    let client_id = ClientId::new();
                    let rx = hub.join("changes", client_id.clone()).await;
                    drop(rx);
                    hub.leave(&client_id).await;
                }
            })
        });
        let publisher = {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                for n in 0..500 {
                    hub.publish("changes", Arc::from(n.to_string())).await;
                }
            })
        };

        let all = futures::future::join_all(churn.chain(std::iter::once(publisher)));
        let results = tokio::time::timeout(Duration::from_secs(10), all)
            .await
            .expect("join/leave stopped making progress");

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(hub.total_client_count().await, 0);
        assert!(hub.active_topics().await.is_empty());
    }
}
