//! Post-commit hand-off of change events to the publisher.

use serde::Serialize;

use crate::domain::notification::ChangeEvent;
use crate::ports::ChangePublisher;

/// Converts a typed event to its wire envelope and publishes it.
///
/// A payload that cannot be represented as JSON is a delivery failure: it is
/// logged and dropped, never reported to the mutation caller.
pub(crate) async fn publish_change<T: Serialize>(
    publisher: &dyn ChangePublisher,
    event: ChangeEvent<T>,
) {
    let notification_type = event.notification_type();
    match event.into_envelope() {
        Ok(envelope) => publisher.publish(envelope).await,
        Err(error) => tracing::warn!(
            %notification_type,
            %error,
            "Dropping change event with unserializable payload"
        ),
    }
}
