//! ScheduleEntry - a planned calendar slot for a task.
//!
//! Schedule entries are never announced on their own; subscribers only learn
//! about them as part of a task cascade.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ScheduleEntryId, TaskId, Timestamp};

use super::{Resource, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: ScheduleEntryId,
    pub task_id: Option<TaskId>,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntryDraft {
    pub task_id: Option<TaskId>,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

impl Resource for ScheduleEntry {
    type Id = ScheduleEntryId;
    type ParentId = TaskId;
    type Draft = ScheduleEntryDraft;

    const KIND: ResourceKind = ResourceKind::ScheduleEntry;

    fn id(&self) -> ScheduleEntryId {
        self.id
    }

    fn parent_id(&self) -> Option<TaskId> {
        self.task_id
    }

    fn from_draft(id: ScheduleEntryId, draft: ScheduleEntryDraft) -> Self {
        Self {
            id,
            task_id: draft.task_id,
            starts_at: draft.starts_at,
            ends_at: draft.ends_at,
        }
    }
}
