//! Session - a stretch of tracked work, optionally attached to a task.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionId, TaskId, Timestamp};

use super::{Resource, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub task_id: Option<TaskId>,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

impl Session {
    /// A session without an end time is still being tracked.
    pub fn is_running(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub task_id: Option<TaskId>,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

impl SessionDraft {
    /// A running session for `task_id` starting now.
    pub fn start(task_id: Option<TaskId>) -> Self {
        Self {
            task_id,
            started_at: Timestamp::now(),
            ended_at: None,
        }
    }
}

impl Resource for Session {
    type Id = SessionId;
    type ParentId = TaskId;
    type Draft = SessionDraft;

    const KIND: ResourceKind = ResourceKind::Session;

    fn id(&self) -> SessionId {
        self.id
    }

    fn parent_id(&self) -> Option<TaskId> {
        self.task_id
    }

    fn from_draft(id: SessionId, draft: SessionDraft) -> Self {
        Self {
            id,
            task_id: draft.task_id,
            started_at: draft.started_at,
            ended_at: draft.ended_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_session_is_running() {
        let session = Session::from_draft(SessionId::new(1), SessionDraft::start(Some(TaskId::new(9))));
        assert!(session.is_running());
        assert_eq!(session.parent_id(), Some(TaskId::new(9)));
    }
}
