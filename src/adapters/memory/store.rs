//! Generic in-memory [`EntityStore`] over the staged tables of a [`MemoryTx`].

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::ports::EntityStore;

use super::database::{MemoryResource, MemoryTx};

/// Store for one resource type. Holds no state of its own.
pub struct MemoryStore<E> {
    _resource: PhantomData<fn() -> E>,
}

impl<E> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            _resource: PhantomData,
        }
    }
}

impl<E> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: MemoryResource> EntityStore<MemoryTx, E> for MemoryStore<E> {
    async fn insert(&self, tx: &mut MemoryTx, draft: E::Draft) -> Result<E, DomainError> {
        let tables = tx.tables_mut();
        let entity = E::from_draft(E::Id::from(tables.allocate_id()), draft);
        E::table_mut(tables).insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, tx: &mut MemoryTx, id: E::Id) -> Result<Option<E>, DomainError> {
        Ok(tx.tables().get::<E>(id).cloned())
    }

    async fn update(&self, tx: &mut MemoryTx, entity: &E) -> Result<Option<E>, DomainError> {
        if !tx.tables().contains::<E>(entity.id()) {
            return Ok(None);
        }
        E::table_mut(tx.tables_mut()).insert(entity.id(), entity.clone());
        Ok(Some(entity.clone()))
    }

    async fn exists(&self, tx: &mut MemoryTx, id: E::Id) -> Result<bool, DomainError> {
        Ok(tx.tables().contains::<E>(id))
    }

    async fn delete(&self, tx: &mut MemoryTx, id: E::Id) -> Result<bool, DomainError> {
        if !tx.tables().contains::<E>(id) {
            return Ok(false);
        }
        let tables = tx.tables_mut();
        E::table_mut(tables).remove(&id);
        E::detach_references(tables, id);
        Ok(true)
    }

    async fn find_ids_by_parent_id(
        &self,
        tx: &mut MemoryTx,
        parent_id: E::ParentId,
    ) -> Result<Vec<E::Id>, DomainError> {
        Ok(E::table(tx.tables())
            .values()
            .filter(|entity| entity.parent_id() == Some(parent_id))
            .map(|entity| entity.id())
            .collect())
    }

    async fn delete_by_parent_id(
        &self,
        tx: &mut MemoryTx,
        parent_id: E::ParentId,
    ) -> Result<u64, DomainError> {
        let ids = self.find_ids_by_parent_id(tx, parent_id).await?;
        if ids.is_empty() {
            return Ok(0);
        }
        let tables = tx.tables_mut();
        for id in &ids {
            E::table_mut(tables).remove(id);
            E::detach_references(tables, *id);
        }
        Ok(ids.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::super::MemoryDatabase;
    use super::*;
    use crate::domain::tracking::Resource;
    use crate::domain::foundation::{SessionId, SessionRecordId, TaskId, Timestamp};
    use crate::domain::tracking::{
        Session, SessionDraft, SessionRecord, SessionRecordDraft, Task, TaskDraft,
    };
    use crate::ports::UnitOfWork;

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let db = MemoryDatabase::new();
        let store = MemoryStore::<Task>::new();

        let mut tx = db.begin().await.unwrap();
        let first = store.insert(&mut tx, TaskDraft::new("a")).await.unwrap();
        let second = store.insert(&mut tx, TaskDraft::new("b")).await.unwrap();

        assert_eq!(first.id, TaskId::new(1));
        assert_eq!(second.id, TaskId::new(2));
    }

    #[tokio::test]
    async fn update_of_missing_row_returns_none() {
        let db = MemoryDatabase::new();
        let store = MemoryStore::<Task>::new();
        let ghost = Task::from_draft(TaskId::new(99), TaskDraft::new("ghost"));

        let mut tx = db.begin().await.unwrap();
        assert!(store.update(&mut tx, &ghost).await.unwrap().is_none());
        assert!(!store.exists(&mut tx, TaskId::new(99)).await.unwrap());
    }

    #[tokio::test]
    async fn parent_queries_only_match_referencing_rows() {
        let db = MemoryDatabase::new();
        let store = MemoryStore::<Session>::new();

        let mut tx = db.begin().await.unwrap();
        let a = store
            .insert(&mut tx, SessionDraft::start(Some(TaskId::new(10))))
            .await
            .unwrap();
        store
            .insert(&mut tx, SessionDraft::start(Some(TaskId::new(20))))
            .await
            .unwrap();
        store.insert(&mut tx, SessionDraft::start(None)).await.unwrap();

        let ids = store
            .find_ids_by_parent_id(&mut tx, TaskId::new(10))
            .await
            .unwrap();
        assert_eq!(ids, vec![a.id]);

        let removed = store
            .delete_by_parent_id(&mut tx, TaskId::new(10))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(!store.exists(&mut tx, a.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_session_nulls_record_reference() {
        let db = MemoryDatabase::new();
        db.put(Session {
            id: SessionId::new(5),
            task_id: None,
            started_at: Timestamp::now(),
            ended_at: None,
        })
        .await;
        db.put(SessionRecord::from_draft(
            SessionRecordId::new(6),
            SessionRecordDraft::new(Some(SessionId::new(5)), None, 60),
        ))
        .await;

        let mut tx = db.begin().await.unwrap();
        assert!(MemoryStore::<Session>::new()
            .delete(&mut tx, SessionId::new(5))
            .await
            .unwrap());
        db.commit(tx).await.unwrap();

        let snapshot = db.snapshot().await;
        let record = snapshot.get::<SessionRecord>(SessionRecordId::new(6)).unwrap();
        assert_eq!(record.session_id, None);
    }
}
