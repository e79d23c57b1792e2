//! EntityStore port - per-resource persistence primitives.
//!
//! Stores never cascade on their own. Deleting a task does not touch its
//! sessions unless the caller asks for that explicitly, which keeps the
//! cascade order a visible decision in application code.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::tracking::{Resource, ScheduleEntry, Session, SessionRecord, Task};

/// Persistence operations for one resource type inside a transaction `Tx`.
///
/// Parent queries take `E::ParentId`; for root resources that type is
/// uninhabited, so those methods can never be called.
#[async_trait]
pub trait EntityStore<Tx: Send, E: Resource>: Send + Sync {
    /// Persist a new resource and return it with its assigned id.
    async fn insert(&self, tx: &mut Tx, draft: E::Draft) -> Result<E, DomainError>;

    async fn find_by_id(&self, tx: &mut Tx, id: E::Id) -> Result<Option<E>, DomainError>;

    /// Overwrite an existing resource.
    ///
    /// Returns the stored representation, or `None` if no row has that id.
    async fn update(&self, tx: &mut Tx, entity: &E) -> Result<Option<E>, DomainError>;

    async fn exists(&self, tx: &mut Tx, id: E::Id) -> Result<bool, DomainError>;

    /// Delete one resource. Returns `false` if it did not exist.
    async fn delete(&self, tx: &mut Tx, id: E::Id) -> Result<bool, DomainError>;

    /// Ids of every resource referencing `parent_id`, in ascending order.
    async fn find_ids_by_parent_id(
        &self,
        tx: &mut Tx,
        parent_id: E::ParentId,
    ) -> Result<Vec<E::Id>, DomainError>;

    /// Delete every resource referencing `parent_id`. Returns the row count.
    async fn delete_by_parent_id(
        &self,
        tx: &mut Tx,
        parent_id: E::ParentId,
    ) -> Result<u64, DomainError>;
}

/// The full set of stores sharing one transaction type.
pub struct TrackingStores<Tx: Send> {
    pub tasks: Arc<dyn EntityStore<Tx, Task>>,
    pub sessions: Arc<dyn EntityStore<Tx, Session>>,
    pub session_records: Arc<dyn EntityStore<Tx, SessionRecord>>,
    pub schedule_entries: Arc<dyn EntityStore<Tx, ScheduleEntry>>,
}

impl<Tx: Send> Clone for TrackingStores<Tx> {
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            sessions: Arc::clone(&self.sessions),
            session_records: Arc::clone(&self.session_records),
            schedule_entries: Arc::clone(&self.schedule_entries),
        }
    }
}
