//! Change event delivery adapters.
//!
//! Adapters implement the publishing side of the notification ports for
//! different environments:
//!
//! - `QueuedChangePublisher` + `DeliveryWorkerPool` - Bounded queue drained
//!   by background workers into a `Broadcaster`
//! - `CapturingPublisher` - Synchronous capture for testing
//! - `RecordingBroadcaster` - Transport stand-in for testing

mod capturing;
mod delivery_pool;
mod queued_publisher;
mod recording_broadcaster;

pub use capturing::CapturingPublisher;
pub use delivery_pool::{DeliveryPoolConfig, DeliveryStats, DeliveryStatsSnapshot, DeliveryWorkerPool};
pub use queued_publisher::QueuedChangePublisher;
pub use recording_broadcaster::RecordingBroadcaster;
