//! ChangePublisher port - hands committed changes to live delivery.
//!
//! This port defines how the application announces mutations without
//! knowing about the underlying transport (queue, WebSocket, test capture).

use async_trait::async_trait;

use crate::domain::notification::ChangeEnvelope;

/// Port for publishing change events after a transaction commits.
///
/// Implementations must ensure:
/// - `publish` never performs network I/O on the caller's task; at most it
///   waits briefly for room in a bounded queue
/// - failures are logged and swallowed; the mutation already committed
/// - events from one caller are forwarded in the order submitted
///
/// Delivery is at-most-once. Subscribers that miss events reconcile by
/// re-reading state.
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    async fn publish(&self, event: ChangeEnvelope);
}
