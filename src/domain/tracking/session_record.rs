//! SessionRecord - a booked span of time.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionId, SessionRecordId, TaskId, Timestamp};

use super::{Resource, ResourceKind};

/// A span of tracked time.
///
/// Records reference their task directly, so a task cascade finds them even
/// when the owning session has already been detached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionRecordId,
    pub session_id: Option<SessionId>,
    pub task_id: Option<TaskId>,
    pub duration_secs: i64,
    pub recorded_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecordDraft {
    pub session_id: Option<SessionId>,
    pub task_id: Option<TaskId>,
    pub duration_secs: i64,
    pub recorded_at: Timestamp,
}

impl SessionRecordDraft {
    pub fn new(session_id: Option<SessionId>, task_id: Option<TaskId>, duration_secs: i64) -> Self {
        Self {
            session_id,
            task_id,
            duration_secs,
            recorded_at: Timestamp::now(),
        }
    }
}

impl Resource for SessionRecord {
    type Id = SessionRecordId;
    type ParentId = TaskId;
    type Draft = SessionRecordDraft;

    const KIND: ResourceKind = ResourceKind::SessionRecord;

    fn id(&self) -> SessionRecordId {
        self.id
    }

    fn parent_id(&self) -> Option<TaskId> {
        self.task_id
    }

    fn from_draft(id: SessionRecordId, draft: SessionRecordDraft) -> Self {
        Self {
            id,
            session_id: draft.session_id,
            task_id: draft.task_id,
            duration_secs: draft.duration_secs,
            recorded_at: draft.recorded_at,
        }
    }
}
