//! Task - the root resource of every cascade.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::domain::foundation::{TaskId, Timestamp};

use super::{Resource, ResourceKind};

/// A unit of work that time is tracked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Caller-supplied fields for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Resource for Task {
    type Id = TaskId;
    type ParentId = Infallible;
    type Draft = TaskDraft;

    const KIND: ResourceKind = ResourceKind::Task;

    fn id(&self) -> TaskId {
        self.id
    }

    fn parent_id(&self) -> Option<Infallible> {
        None
    }

    fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            title: draft.title,
            description: draft.description,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
