//! Change event envelope sent to live subscribers.
//!
//! One event is built per committed mutation. Cascade side effects travel
//! inside the same event as [`AffectedGroup`]s, so a subscriber never sees a
//! parent deletion with only part of its dependents reported.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::{epoch_millis, Timestamp};

use super::{ChangeAction, NotificationType};

/// One category of secondary resources touched by a cascade.
///
/// A group is present even when `ids` is empty: "the cascade ran and found
/// nothing" is distinct from "no cascade happened" (no `affected` at all).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedGroup {
    notification_type: NotificationType,
    ids: Vec<i64>,
}

impl AffectedGroup {
    pub fn new<I>(notification_type: NotificationType, ids: impl IntoIterator<Item = I>) -> Self
    where
        I: Into<i64>,
    {
        Self {
            notification_type,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn notification_type(&self) -> NotificationType {
        self.notification_type
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }
}

/// Immutable description of one mutation.
///
/// Invariants enforced by the constructors:
/// - `data` is present iff the type is a create or update
/// - `affected` is present only on cascade deletions
/// - `ids` is reserved for batch operations and never populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent<T> {
    notification_type: NotificationType,
    id: Option<i64>,
    ids: Option<Vec<i64>>,
    data: Option<T>,
    affected: Option<Vec<AffectedGroup>>,
    #[serde(with = "epoch_millis")]
    timestamp: Timestamp,
}

/// A change event with its payload already converted to JSON.
///
/// This is the form that crosses the publisher boundary, so one queue can
/// carry events about every resource type.
pub type ChangeEnvelope = ChangeEvent<JsonValue>;

impl<T> ChangeEvent<T> {
    fn build(
        notification_type: NotificationType,
        id: i64,
        data: Option<T>,
        affected: Option<Vec<AffectedGroup>>,
    ) -> Self {
        Self {
            notification_type,
            id: Some(id),
            ids: None,
            data,
            affected,
            timestamp: Timestamp::now_monotonic(),
        }
    }

    /// A resource was created; `data` is its stored representation.
    pub fn created(notification_type: NotificationType, id: impl Into<i64>, data: T) -> Self {
        debug_assert_eq!(notification_type.action(), ChangeAction::Create);
        Self::build(notification_type, id.into(), Some(data), None)
    }

    /// A resource was updated; `data` is its stored representation.
    pub fn updated(notification_type: NotificationType, id: impl Into<i64>, data: T) -> Self {
        debug_assert_eq!(notification_type.action(), ChangeAction::Update);
        Self::build(notification_type, id.into(), Some(data), None)
    }

    /// A resource was deleted without touching anything else.
    pub fn deleted(notification_type: NotificationType, id: impl Into<i64>) -> Self {
        debug_assert_eq!(notification_type.action(), ChangeAction::Delete);
        Self::build(notification_type, id.into(), None, None)
    }

    /// A resource was deleted together with its dependents.
    pub fn cascade_deleted(
        notification_type: NotificationType,
        id: impl Into<i64>,
        affected: Vec<AffectedGroup>,
    ) -> Self {
        debug_assert_eq!(notification_type.action(), ChangeAction::Delete);
        Self::build(notification_type, id.into(), None, Some(affected))
    }

    pub fn notification_type(&self) -> NotificationType {
        self.notification_type
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn ids(&self) -> Option<&[i64]> {
        self.ids.as_deref()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn affected(&self) -> Option<&[AffectedGroup]> {
        self.affected.as_deref()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl<T: Serialize> ChangeEvent<T> {
    /// Converts the typed payload to JSON, keeping every other field as is.
    pub fn into_envelope(self) -> Result<ChangeEnvelope, serde_json::Error> {
        let data = self.data.map(serde_json::to_value).transpose()?;
        Ok(ChangeEvent {
            notification_type: self.notification_type,
            id: self.id,
            ids: self.ids,
            data,
            affected: self.affected,
            timestamp: self.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn created_event_carries_data() {
        let event = ChangeEvent::created(NotificationType::TaskCreate, 5i64, json!({"title": "a"}));
        assert_eq!(event.id(), Some(5));
        assert!(event.data().is_some());
        assert!(event.affected().is_none());
        assert!(event.ids().is_none());
    }

    #[test]
    fn deleted_event_has_no_data_and_no_affected() {
        let event: ChangeEnvelope = ChangeEvent::deleted(NotificationType::SessionDelete, 7i64);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["notificationType"], "session_delete");
        assert_eq!(json["id"], 7);
        assert!(json["data"].is_null());
        assert!(json["affected"].is_null());
        assert!(json["ids"].is_null());
    }

    #[test]
    fn empty_affected_group_still_serializes() {
        let event: ChangeEnvelope = ChangeEvent::cascade_deleted(
            NotificationType::TaskDelete,
            20i64,
            vec![AffectedGroup::new(NotificationType::SessionDelete, Vec::<i64>::new())],
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json["affected"],
            json!([{"notificationType": "session_delete", "ids": []}])
        );
    }

    #[test]
    fn timestamp_is_epoch_millis() {
        let event: ChangeEnvelope = ChangeEvent::deleted(NotificationType::SessionRecordDelete, 1i64);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["timestamp"], event.timestamp().epoch_millis());
    }

    #[test]
    fn into_envelope_preserves_fields() {
        #[derive(Serialize)]
        struct Payload {
            title: &'static str,
        }

        let event = ChangeEvent::updated(NotificationType::TaskUpdate, 3i64, Payload { title: "b" });
        let timestamp = event.timestamp();
        let envelope = event.into_envelope().unwrap();

        assert_eq!(envelope.notification_type(), NotificationType::TaskUpdate);
        assert_eq!(envelope.data(), Some(&json!({"title": "b"})));
        assert_eq!(envelope.timestamp(), timestamp);
    }

    #[test]
    fn envelope_round_trips_through_json() {
        let event: ChangeEnvelope = ChangeEvent::cascade_deleted(
            NotificationType::TaskDelete,
            10i64,
            vec![AffectedGroup::new(NotificationType::SessionDelete, [101i64, 102])],
        );
        let text = serde_json::to_string(&event).unwrap();
        let parsed: ChangeEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, event);
    }
}
