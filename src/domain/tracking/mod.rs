//! Tracked resources: tasks and the time-tracking data hanging off them.
//!
//! ```text
//! Task
//! ├── Session         (task_id, nullable)
//! ├── SessionRecord   (task_id, session_id, both nullable)
//! └── ScheduleEntry   (task_id, nullable)
//! ```

mod resource;
mod schedule_entry;
mod session;
mod session_record;
mod task;

pub use resource::{Resource, ResourceKind};
pub use schedule_entry::{ScheduleEntry, ScheduleEntryDraft};
pub use session::{Session, SessionDraft};
pub use session_record::{SessionRecord, SessionRecordDraft};
pub use task::{Task, TaskDraft};
