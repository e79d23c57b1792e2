//! In-memory database with real transaction semantics.
//!
//! Transactions are serialized: `begin` takes an owned lock on the tables and
//! works on a staged copy. `commit` swaps the copy in; `rollback` (or simply
//! dropping the transaction) throws it away, so a failed cascade leaves no
//! trace.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::DomainError;
use crate::domain::tracking::{Resource, ScheduleEntry, Session, SessionRecord, Task};
use crate::ports::{TrackingStores, UnitOfWork};

use super::store::MemoryStore;

/// The four tables plus the shared id sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryTables {
    tasks: BTreeMap<<Task as Resource>::Id, Task>,
    sessions: BTreeMap<<Session as Resource>::Id, Session>,
    session_records: BTreeMap<<SessionRecord as Resource>::Id, SessionRecord>,
    schedule_entries: BTreeMap<<ScheduleEntry as Resource>::Id, ScheduleEntry>,
    next_id: i64,
}

impl Default for MemoryTables {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
            sessions: BTreeMap::new(),
            session_records: BTreeMap::new(),
            schedule_entries: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl MemoryTables {
    pub fn get<E: MemoryResource>(&self, id: E::Id) -> Option<&E> {
        E::table(self).get(&id)
    }

    pub fn contains<E: MemoryResource>(&self, id: E::Id) -> bool {
        E::table(self).contains_key(&id)
    }

    pub fn count<E: MemoryResource>(&self) -> usize {
        E::table(self).len()
    }

    pub(super) fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Stores `entity` under its own id, keeping the sequence ahead of it.
    pub(super) fn put<E: MemoryResource>(&mut self, entity: E) {
        let raw: i64 = entity.id().into();
        self.next_id = self.next_id.max(raw + 1);
        E::table_mut(self).insert(entity.id(), entity);
    }
}

/// Resources that have a table in [`MemoryTables`].
pub trait MemoryResource: Resource {
    fn table(tables: &MemoryTables) -> &BTreeMap<Self::Id, Self>;

    fn table_mut(tables: &mut MemoryTables) -> &mut BTreeMap<Self::Id, Self>;

    /// Clears references to a deleted row, mirroring `ON DELETE SET NULL`.
    fn detach_references(_tables: &mut MemoryTables, _id: Self::Id) {}
}

impl MemoryResource for Task {
    fn table(tables: &MemoryTables) -> &BTreeMap<Self::Id, Self> {
        &tables.tasks
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut BTreeMap<Self::Id, Self> {
        &mut tables.tasks
    }

    fn detach_references(tables: &mut MemoryTables, id: Self::Id) {
        for session in tables.sessions.values_mut() {
            if session.task_id == Some(id) {
                session.task_id = None;
            }
        }
        for record in tables.session_records.values_mut() {
            if record.task_id == Some(id) {
                record.task_id = None;
            }
        }
        for entry in tables.schedule_entries.values_mut() {
            if entry.task_id == Some(id) {
                entry.task_id = None;
            }
        }
    }
}

impl MemoryResource for Session {
    fn table(tables: &MemoryTables) -> &BTreeMap<Self::Id, Self> {
        &tables.sessions
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut BTreeMap<Self::Id, Self> {
        &mut tables.sessions
    }

    fn detach_references(tables: &mut MemoryTables, id: Self::Id) {
        for record in tables.session_records.values_mut() {
            if record.session_id == Some(id) {
                record.session_id = None;
            }
        }
    }
}

impl MemoryResource for SessionRecord {
    fn table(tables: &MemoryTables) -> &BTreeMap<Self::Id, Self> {
        &tables.session_records
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut BTreeMap<Self::Id, Self> {
        &mut tables.session_records
    }
}

impl MemoryResource for ScheduleEntry {
    fn table(tables: &MemoryTables) -> &BTreeMap<Self::Id, Self> {
        &tables.schedule_entries
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut BTreeMap<Self::Id, Self> {
        &mut tables.schedule_entries
    }
}

/// An open in-memory transaction.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryTables>,
    staged: MemoryTables,
    dirty: bool,
}

impl MemoryTx {
    pub(super) fn tables(&self) -> &MemoryTables {
        &self.staged
    }

    /// Mutable access to the staged tables; marks the transaction as a write.
    pub(super) fn tables_mut(&mut self) -> &mut MemoryTables {
        self.dirty = true;
        &mut self.staged
    }
}

/// Shared in-memory database for tests and local runs.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<MemoryTables>>,
    committed_writes: Arc<AtomicU64>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores bound to this database's transaction type.
    pub fn stores(&self) -> TrackingStores<MemoryTx> {
        TrackingStores {
            tasks: Arc::new(MemoryStore::<Task>::new()),
            sessions: Arc::new(MemoryStore::<Session>::new()),
            session_records: Arc::new(MemoryStore::<SessionRecord>::new()),
            schedule_entries: Arc::new(MemoryStore::<ScheduleEntry>::new()),
        }
    }

    /// Seeds a row with an explicit id, bypassing transactions and counters.
    pub async fn put<E: MemoryResource>(&self, entity: E) {
        self.tables.lock().await.put(entity);
    }

    /// A copy of the committed state.
    pub async fn snapshot(&self) -> MemoryTables {
        self.tables.lock().await.clone()
    }

    /// Number of commits that carried at least one write.
    pub fn committed_writes(&self) -> u64 {
        self.committed_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UnitOfWork for MemoryDatabase {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, DomainError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTx {
            guard,
            staged,
            dirty: false,
        })
    }

    async fn commit(&self, tx: MemoryTx) -> Result<(), DomainError> {
        let MemoryTx {
            mut guard,
            staged,
            dirty,
        } = tx;
        if dirty {
            *guard = staged;
            self.committed_writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> Result<(), DomainError> {
        drop(tx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{TaskId, Timestamp};

    fn task(id: i64) -> Task {
        Task {
            id: TaskId::new(id),
            title: format!("task {id}"),
            description: None,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn commit_publishes_staged_writes() {
        let db = MemoryDatabase::new();

        let mut tx = db.begin().await.unwrap();
        tx.tables_mut().put(task(1));
        db.commit(tx).await.unwrap();

        assert!(db.snapshot().await.contains::<Task>(TaskId::new(1)));
        assert_eq!(db.committed_writes(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_staged_writes() {
        let db = MemoryDatabase::new();

        let mut tx = db.begin().await.unwrap();
        tx.tables_mut().put(task(1));
        db.rollback(tx).await.unwrap();

        assert_eq!(db.snapshot().await.count::<Task>(), 0);
        assert_eq!(db.committed_writes(), 0);
    }

    #[tokio::test]
    async fn read_only_commit_is_not_counted() {
        let db = MemoryDatabase::new();
        let tx = db.begin().await.unwrap();
        db.commit(tx).await.unwrap();
        assert_eq!(db.committed_writes(), 0);
    }

    #[tokio::test]
    async fn put_keeps_sequence_ahead_of_seeded_ids() {
        let db = MemoryDatabase::new();
        db.put(task(10)).await;

        let mut tx = db.begin().await.unwrap();
        assert_eq!(tx.tables_mut().allocate_id(), 11);
    }

    #[tokio::test]
    async fn deleting_task_detaches_children() {
        let mut tables = MemoryTables::default();
        tables.put(task(1));
        tables.put(Session {
            id: 2.into(),
            task_id: Some(TaskId::new(1)),
            started_at: Timestamp::now(),
            ended_at: None,
        });

        Task::detach_references(&mut tables, TaskId::new(1));

        assert_eq!(tables.get::<Session>(2.into()).unwrap().task_id, None);
    }
}
