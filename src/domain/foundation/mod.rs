//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the Timekeeper domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use ids::{ScheduleEntryId, SessionId, SessionRecordId, TaskId};
pub use timestamp::{epoch_millis, Timestamp};
