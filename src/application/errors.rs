//! Errors surfaced to callers of mutating operations.
//!
//! Delivery failures are deliberately absent: once a mutation commits, the
//! caller sees success regardless of what happens to its change event.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::tracking::ResourceKind;

#[derive(Debug, Clone, Error)]
pub enum MutationError {
    /// The primary resource does not exist. Nothing was changed.
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: i64 },

    /// A store call failed. The transaction was rolled back.
    #[error(transparent)]
    Store(#[from] DomainError),
}

impl MutationError {
    pub fn not_found(kind: ResourceKind, id: impl Into<i64>) -> Self {
        MutationError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MutationError::NotFound { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            MutationError::NotFound { kind, .. } => match kind {
                ResourceKind::Task => ErrorCode::TaskNotFound,
                ResourceKind::Session => ErrorCode::SessionNotFound,
                ResourceKind::SessionRecord => ErrorCode::SessionRecordNotFound,
                ResourceKind::ScheduleEntry => ErrorCode::ScheduleEntryNotFound,
            },
            MutationError::Store(err) => err.code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_displays_kind_and_id() {
        let err = MutationError::not_found(ResourceKind::Task, 10i64);
        assert_eq!(err.to_string(), "task not found: 10");
        assert_eq!(err.code(), ErrorCode::TaskNotFound);
        assert!(err.is_not_found());
    }

    #[test]
    fn store_error_keeps_domain_code() {
        let err: MutationError = DomainError::database("Failed to delete", "disk full").into();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "[DATABASE_ERROR] Failed to delete: disk full");
    }
}
