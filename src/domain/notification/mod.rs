//! Resource-change notifications.
//!
//! - [`NotificationType`] - the registry of wire discriminators
//! - [`ChangeEvent`] / [`AffectedGroup`] - the envelope subscribers receive
//! - `Announces*` traits - which mutations of which resource are published

mod change_event;
mod notification_type;

pub use change_event::{AffectedGroup, ChangeEnvelope, ChangeEvent};
pub use notification_type::{ChangeAction, NotificationType, UnknownNotificationType};

use crate::domain::tracking::{Resource, Session, SessionRecord, Task};

/// Resources whose creation is published as a top-level event.
pub trait AnnouncesCreate: Resource {
    const CREATE: NotificationType;
}

/// Resources whose updates are published as a top-level event.
pub trait AnnouncesUpdate: Resource {
    const UPDATE: NotificationType;
}

/// Resources that can be deleted on their own, without a cascade.
///
/// Tasks are deliberately absent: deleting a task always goes through the
/// cascade so its dependents are reported alongside it.
pub trait AnnouncesDelete: Resource {
    const DELETE: NotificationType;
}

impl AnnouncesCreate for Task {
    const CREATE: NotificationType = NotificationType::TaskCreate;
}

impl AnnouncesUpdate for Task {
    const UPDATE: NotificationType = NotificationType::TaskUpdate;
}

impl AnnouncesCreate for Session {
    const CREATE: NotificationType = NotificationType::SessionCreate;
}

impl AnnouncesDelete for Session {
    const DELETE: NotificationType = NotificationType::SessionDelete;
}

impl AnnouncesCreate for SessionRecord {
    const CREATE: NotificationType = NotificationType::SessionRecordCreate;
}

impl AnnouncesUpdate for SessionRecord {
    const UPDATE: NotificationType = NotificationType::SessionRecordUpdate;
}

impl AnnouncesDelete for SessionRecord {
    const DELETE: NotificationType = NotificationType::SessionRecordDelete;
}
