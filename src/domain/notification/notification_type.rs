//! Notification type registry.
//!
//! The single mapping between change kinds and the strings subscribers
//! match on. Entries may be added; existing wire strings must never be
//! renamed or removed.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::domain::tracking::ResourceKind;

/// The mutation a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    /// Create and update events carry the resulting resource as `data`.
    pub fn carries_data(&self) -> bool {
        matches!(self, ChangeAction::Create | ChangeAction::Update)
    }
}

/// Discriminator for top-level change events and cascade groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    TaskCreate,
    TaskUpdate,
    TaskDelete,
    SessionCreate,
    SessionDelete,
    SessionRecordCreate,
    SessionRecordUpdate,
    SessionRecordDelete,
    ScheduleEntryDelete,
}

impl NotificationType {
    /// Every registered type, in registration order.
    pub const ALL: [NotificationType; 9] = [
        NotificationType::TaskCreate,
        NotificationType::TaskUpdate,
        NotificationType::TaskDelete,
        NotificationType::SessionCreate,
        NotificationType::SessionDelete,
        NotificationType::SessionRecordCreate,
        NotificationType::SessionRecordUpdate,
        NotificationType::SessionRecordDelete,
        NotificationType::ScheduleEntryDelete,
    ];

    /// The stable wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::TaskCreate => "task_create",
            NotificationType::TaskUpdate => "task_update",
            NotificationType::TaskDelete => "task_delete",
            NotificationType::SessionCreate => "session_create",
            NotificationType::SessionDelete => "session_delete",
            NotificationType::SessionRecordCreate => "session_record_create",
            NotificationType::SessionRecordUpdate => "session_record_update",
            NotificationType::SessionRecordDelete => "session_record_delete",
            NotificationType::ScheduleEntryDelete => "schedule_entry_delete",
        }
    }

    /// Looks up a type by its wire string.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    pub fn action(&self) -> ChangeAction {
        match self {
            NotificationType::TaskCreate
            | NotificationType::SessionCreate
            | NotificationType::SessionRecordCreate => ChangeAction::Create,
            NotificationType::TaskUpdate | NotificationType::SessionRecordUpdate => {
                ChangeAction::Update
            }
            NotificationType::TaskDelete
            | NotificationType::SessionDelete
            | NotificationType::SessionRecordDelete
            | NotificationType::ScheduleEntryDelete => ChangeAction::Delete,
        }
    }

    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            NotificationType::TaskCreate
            | NotificationType::TaskUpdate
            | NotificationType::TaskDelete => ResourceKind::Task,
            NotificationType::SessionCreate | NotificationType::SessionDelete => {
                ResourceKind::Session
            }
            NotificationType::SessionRecordCreate
            | NotificationType::SessionRecordUpdate
            | NotificationType::SessionRecordDelete => ResourceKind::SessionRecord,
            NotificationType::ScheduleEntryDelete => ResourceKind::ScheduleEntry,
        }
    }

    /// Resolves the registered type for a change, if that change is announced.
    ///
    /// Returns `None` for combinations with no wire representation, such as
    /// schedule entry creation.
    pub fn resolve(kind: ResourceKind, action: ChangeAction) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.resource_kind() == kind && t.action() == action)
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unregistered wire string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification type: {0}")]
pub struct UnknownNotificationType(pub String);

impl FromStr for NotificationType {
    type Err = UnknownNotificationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| UnknownNotificationType(s.to_string()))
    }
}

impl Serialize for NotificationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn wire_strings_are_stable() {
        let expected = [
            "task_create",
            "task_update",
            "task_delete",
            "session_create",
            "session_delete",
            "session_record_create",
            "session_record_update",
            "session_record_delete",
            "schedule_entry_delete",
        ];
        let actual: Vec<&str> = NotificationType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn wire_strings_are_unique() {
        let unique: HashSet<&str> = NotificationType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(unique.len(), NotificationType::ALL.len());
    }

    #[test]
    fn every_type_parses_back_from_its_wire_string() {
        for t in NotificationType::ALL {
            assert_eq!(t.as_str().parse::<NotificationType>().unwrap(), t);
        }
    }

    #[test]
    fn unknown_wire_string_is_rejected() {
        let err = "schedule_entry_create".parse::<NotificationType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown notification type: schedule_entry_create");
    }

    #[test]
    fn serde_uses_wire_string() {
        let json = serde_json::to_string(&NotificationType::SessionRecordDelete).unwrap();
        assert_eq!(json, "\"session_record_delete\"");

        let parsed: NotificationType = serde_json::from_str("\"task_update\"").unwrap();
        assert_eq!(parsed, NotificationType::TaskUpdate);
    }

    #[test]
    fn resolve_finds_registered_combinations_only() {
        assert_eq!(
            NotificationType::resolve(ResourceKind::Session, ChangeAction::Delete),
            Some(NotificationType::SessionDelete)
        );
        assert_eq!(
            NotificationType::resolve(ResourceKind::ScheduleEntry, ChangeAction::Create),
            None
        );
        assert_eq!(
            NotificationType::resolve(ResourceKind::Session, ChangeAction::Update),
            None
        );
    }

    #[test]
    fn only_create_and_update_carry_data() {
        for t in NotificationType::ALL {
            let expected = !matches!(t.action(), ChangeAction::Delete);
            assert_eq!(t.action().carries_data(), expected, "{}", t);
        }
    }
}
