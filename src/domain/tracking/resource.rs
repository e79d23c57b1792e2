//! The `Resource` contract shared by every tracked entity.
//!
//! Stores and mutation handlers are written once against this trait and
//! instantiated per entity type.

use serde::Serialize;
use std::fmt;
use std::hash::Hash;

/// The kinds of resource the service tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Task,
    Session,
    SessionRecord,
    ScheduleEntry,
}

impl ResourceKind {
    /// Human-readable lowercase name, used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Task => "task",
            ResourceKind::Session => "session",
            ResourceKind::SessionRecord => "session record",
            ResourceKind::ScheduleEntry => "schedule entry",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted entity addressable by a typed integer id.
///
/// `ParentId` names the resource whose deletion cascades into this one.
/// Root resources use [`std::convert::Infallible`], which makes parent
/// queries against them unrepresentable.
pub trait Resource: Clone + fmt::Debug + Serialize + Send + Sync + 'static {
    type Id: Copy
        + Eq
        + Ord
        + Hash
        + fmt::Debug
        + fmt::Display
        + From<i64>
        + Into<i64>
        + Send
        + Sync
        + 'static;
    type ParentId: Copy + Eq + fmt::Debug + Send + Sync + 'static;
    /// Field values supplied by the caller before an id is assigned.
    type Draft: Send + 'static;

    const KIND: ResourceKind;

    fn id(&self) -> Self::Id;

    /// The parent this resource currently references, if any.
    fn parent_id(&self) -> Option<Self::ParentId>;

    /// Builds the stored representation once the store has assigned an id.
    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self;

    /// Refreshes bookkeeping fields before an update is persisted.
    fn touch(&mut self) {}
}
