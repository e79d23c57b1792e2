//! DeliveryWorkerPool - Background workers forwarding change events to the
//! broadcaster.
//!
//! Request handlers enqueue events through a [`QueuedChangePublisher`]; a
//! small fixed pool of workers drains that bounded queue and hands each
//! event to the [`Broadcaster`].
//!
//! ## Ordering
//!
//! Every dequeued event gets a ticket, taken under the same lock as the
//! dequeue. Workers encode in parallel but hand off to the broadcaster
//! strictly in ticket order, so subscribers see events in submission order
//! no matter how many workers run.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `workers` | 3 | Worker tasks, clamped to 1..=5 |
//! | `queue_capacity` | 1024 | Bounded queue size |
//! | `enqueue_timeout` | 25ms | Max producer wait on a full queue |
//! | `publish_timeout` | 1s | Max time for one broadcaster handoff |
//! | `topic` | `changes` | Topic every event is published to |
//!
//! ## Graceful Shutdown
//!
//! [`DeliveryWorkerPool::shutdown`] stops the workers once the events already
//! queued have been forwarded. Anything enqueued after that is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::{DeliveryConfig, MAX_DELIVERY_WORKERS};
use crate::domain::notification::ChangeEnvelope;
use crate::ports::{Broadcaster, DeliveryError};

use super::QueuedChangePublisher;

/// Configuration for the delivery worker pool.
#[derive(Debug, Clone)]
pub struct DeliveryPoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub enqueue_timeout: Duration,
    pub publish_timeout: Duration,
    pub topic: String,
}

impl Default for DeliveryPoolConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            queue_capacity: 1024,
            enqueue_timeout: Duration::from_millis(25),
            publish_timeout: Duration::from_secs(1),
            topic: "changes".to_string(),
        }
    }
}

impl DeliveryPoolConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_enqueue_timeout(mut self, timeout: Duration) -> Self {
        self.enqueue_timeout = timeout;
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }
}

impl From<&DeliveryConfig> for DeliveryPoolConfig {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            workers: config.workers,
            queue_capacity: config.queue_capacity,
            enqueue_timeout: config.enqueue_timeout(),
            publish_timeout: config.publish_timeout(),
            topic: config.topic.clone(),
        }
    }
}

/// Running totals for the delivery path.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    forwarded: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`DeliveryStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStatsSnapshot {
    /// Accepted into the queue.
    pub enqueued: u64,
    /// Never made it into the queue, or left in it at shutdown.
    pub dropped: u64,
    /// Handed to the broadcaster successfully.
    pub forwarded: u64,
    /// Dequeued but failed to encode or broadcast.
    pub failed: u64,
}

impl DeliveryStats {
    pub(super) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryStatsSnapshot {
        DeliveryStatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

struct QueueState {
    receiver: mpsc::Receiver<ChangeEnvelope>,
    next_ticket: u64,
}

impl QueueState {
    fn take(&mut self, event: ChangeEnvelope) -> (u64, ChangeEnvelope) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        (ticket, event)
    }
}

/// State shared by every worker.
struct Shared {
    queue: Mutex<QueueState>,
    /// Ticket whose turn it is to hand off.
    turnstile: watch::Sender<u64>,
    broadcaster: Arc<dyn Broadcaster>,
    topic: String,
    publish_timeout: Duration,
    stats: Arc<DeliveryStats>,
}

/// Held while a worker owns the handoff slot; passes the turn on when dropped.
struct Turn<'a> {
    turnstile: &'a watch::Sender<u64>,
    ticket: u64,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        let next = self.ticket + 1;
        self.turnstile.send_modify(|current| *current = (*current).max(next));
    }
}

impl Shared {
    /// Waits for the next queued event. `None` once every publisher is gone.
    async fn next(&self) -> Option<(u64, ChangeEnvelope)> {
        let mut queue = self.queue.lock().await;
        let event = queue.receiver.recv().await?;
        Some(queue.take(event))
    }

    /// Takes an already queued event without waiting.
    async fn next_queued(&self) -> Option<(u64, ChangeEnvelope)> {
        let mut queue = self.queue.lock().await;
        let event = queue.receiver.try_recv().ok()?;
        Some(queue.take(event))
    }

    async fn wait_for_turn(&self, ticket: u64) -> Turn<'_> {
        let mut turns = self.turnstile.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = turns.wait_for(|current| *current >= ticket).await;
        Turn {
            turnstile: &self.turnstile,
            ticket,
        }
    }

    async fn deliver(&self, worker: usize, ticket: u64, event: ChangeEnvelope) {
        let notification_type = event.notification_type();
        let encoded = serde_json::to_vec(&event).map_err(DeliveryError::from);

        let turn = self.wait_for_turn(ticket).await;
        let result = match encoded {
            Ok(payload) => {
                let handoff = self.broadcaster.publish_to_topic(&self.topic, payload);
                match time::timeout(self.publish_timeout, handoff).await {
                    Ok(result) => result,
                    Err(_) => Err(DeliveryError::Timeout(self.publish_timeout)),
                }
            }
            Err(error) => Err(error),
        };
        drop(turn);

        match result {
            Ok(()) => {
                self.stats.record_forwarded();
                tracing::debug!(
                    worker,
                    ticket,
                    %notification_type,
                    id = ?event.id(),
                    "Forwarded change event"
                );
            }
            Err(error) => {
                self.stats.record_failed();
                tracing::warn!(
                    worker,
                    ticket,
                    %notification_type,
                    id = ?event.id(),
                    %error,
                    "Failed to forward change event"
                );
            }
        }
    }
}

/// Handle to the running delivery workers.
pub struct DeliveryWorkerPool {
    shared: Arc<Shared>,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl DeliveryWorkerPool {
    /// Spawns the workers and returns the publisher that feeds them.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        config: DeliveryPoolConfig,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> (QueuedChangePublisher, DeliveryWorkerPool) {
        let workers = config.workers.clamp(1, MAX_DELIVERY_WORKERS);
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let stats = Arc::new(DeliveryStats::default());
        let (turnstile, _) = watch::channel(0u64);
        let (shutdown, _) = watch::channel(false);

        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                receiver,
                next_ticket: 0,
            }),
            turnstile,
            broadcaster,
            topic: config.topic.clone(),
            publish_timeout: config.publish_timeout,
            stats: Arc::clone(&stats),
        });

        let handles = (0..workers)
            .map(|worker| {
                let shared = Arc::clone(&shared);
                let shutdown = shutdown.subscribe();
                tokio::spawn(run_worker(worker, shared, shutdown))
            })
            .collect();

        tracing::info!(
            workers,
            queue_capacity = config.queue_capacity,
            topic = %config.topic,
            "Delivery worker pool started"
        );

        let publisher = QueuedChangePublisher::new(sender, config.enqueue_timeout, stats);
        let pool = DeliveryWorkerPool {
            shared,
            shutdown,
            handles,
        };
        (publisher, pool)
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    pub fn stats(&self) -> DeliveryStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Forwards everything already queued, then stops the workers.
    ///
    /// The queue is closed afterwards: later publishes are dropped as
    /// `QueueClosed`.
    pub async fn shutdown(self) -> DeliveryStatsSnapshot {
        let _ = self.shutdown.send(true);

        for handle in self.handles {
            if let Err(error) = handle.await {
                tracing::error!(%error, "Delivery worker terminated abnormally");
            }
        }

        let mut queue = self.shared.queue.lock().await;
        queue.receiver.close();
        let mut stranded = 0u64;
        while queue.receiver.try_recv().is_ok() {
            self.shared.stats.record_dropped();
            stranded += 1;
        }
        if stranded > 0 {
            tracing::warn!(stranded, "Dropped change events enqueued during shutdown");
        }

        let stats = self.shared.stats.snapshot();
        tracing::info!(
            forwarded = stats.forwarded,
            failed = stats.failed,
            dropped = stats.dropped,
            "Delivery worker pool stopped"
        );
        stats
    }
}

async fn run_worker(worker: usize, shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    tracing::debug!(worker, "Delivery worker started");

    loop {
        let next = tokio::select! {
            next = shared.next() => next,
            _ = shutdown.changed() => None,
        };
        match next {
            Some((ticket, event)) => shared.deliver(worker, ticket, event).await,
            None => break,
        }
    }

    // Drain what was queued before shutdown
    while let Some((ticket, event)) = shared.next_queued().await {
        shared.deliver(worker, ticket, event).await;
    }

    tracing::debug!(worker, "Delivery worker stopped");
}
