//! DeleteTaskCascadeHandler - Command handler for deleting a task together
//! with everything that references it.
//!
//! The whole cascade runs in one transaction:
//!
//! 1. Confirm the task exists (and lock it against concurrent child inserts)
//! 2. Collect the ids of every dependent, before anything is deleted
//! 3. Delete session records, then sessions, then schedule entries
//! 4. Delete the task
//!
//! Exactly one `task_delete` event is published after commit, listing every
//! dependent category in `affected` even when a category is empty.

use std::sync::Arc;

use crate::domain::foundation::{ScheduleEntryId, SessionId, SessionRecordId, TaskId};
use crate::domain::notification::{AffectedGroup, ChangeEnvelope, ChangeEvent, NotificationType};
use crate::domain::tracking::ResourceKind;
use crate::ports::{ChangePublisher, TrackingStores, UnitOfWork};

use crate::application::{MutationError, TransactionRunner};

/// Command to delete a task and its dependents.
#[derive(Debug, Clone, Copy)]
pub struct DeleteTaskCascadeCommand {
    pub task_id: TaskId,
}

/// What a committed cascade removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeSummary {
    pub task_id: TaskId,
    pub session_ids: Vec<SessionId>,
    pub session_record_ids: Vec<SessionRecordId>,
    pub schedule_entry_ids: Vec<ScheduleEntryId>,
}

impl CascadeSummary {
    /// Dependent groups in the order subscribers receive them.
    pub fn affected_groups(&self) -> Vec<AffectedGroup> {
        vec![
            AffectedGroup::new(NotificationType::SessionDelete, self.session_ids.iter().copied()),
            AffectedGroup::new(
                NotificationType::SessionRecordDelete,
                self.session_record_ids.iter().copied(),
            ),
            AffectedGroup::new(
                NotificationType::ScheduleEntryDelete,
                self.schedule_entry_ids.iter().copied(),
            ),
        ]
    }

    pub fn dependent_count(&self) -> usize {
        self.session_ids.len() + self.session_record_ids.len() + self.schedule_entry_ids.len()
    }

    pub fn to_event(&self) -> ChangeEnvelope {
        ChangeEvent::cascade_deleted(
            NotificationType::TaskDelete,
            self.task_id,
            self.affected_groups(),
        )
    }
}

/// Handler for cascading task deletion.
pub struct DeleteTaskCascadeHandler<U: UnitOfWork> {
    transactions: TransactionRunner<U>,
    stores: TrackingStores<U::Tx>,
    publisher: Arc<dyn ChangePublisher>,
}

impl<U: UnitOfWork> DeleteTaskCascadeHandler<U> {
    pub fn new(
        transactions: TransactionRunner<U>,
        stores: TrackingStores<U::Tx>,
        publisher: Arc<dyn ChangePublisher>,
    ) -> Self {
        Self {
            transactions,
            stores,
            publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: DeleteTaskCascadeCommand,
    ) -> Result<CascadeSummary, MutationError> {
        let stores = self.stores.clone();
        let publisher = Arc::clone(&self.publisher);
        let task_id = cmd.task_id;

        self.transactions
            .run(
                move |tx| Box::pin(async move { delete_cascade(&stores, tx, task_id).await }),
                move |summary: CascadeSummary| async move {
                    tracing::info!(
                        task_id = %summary.task_id,
                        sessions = summary.session_ids.len(),
                        session_records = summary.session_record_ids.len(),
                        schedule_entries = summary.schedule_entry_ids.len(),
                        "Task deleted with dependents"
                    );
                    publisher.publish(summary.to_event()).await;
                    summary
                },
            )
            .await
    }
}

/// The cascade itself. Every call goes through `tx`.
async fn delete_cascade<Tx: Send>(
    stores: &TrackingStores<Tx>,
    tx: &mut Tx,
    task_id: TaskId,
) -> Result<CascadeSummary, MutationError> {
    // 1. Existence check first: a missing task must not touch anything
    if !stores.tasks.exists(tx, task_id).await? {
        return Err(MutationError::not_found(ResourceKind::Task, task_id));
    }

    // 2. Collect dependents while they are still there
    let session_ids = stores.sessions.find_ids_by_parent_id(tx, task_id).await?;
    let session_record_ids = stores
        .session_records
        .find_ids_by_parent_id(tx, task_id)
        .await?;
    let schedule_entry_ids = stores
        .schedule_entries
        .find_ids_by_parent_id(tx, task_id)
        .await?;

    tracing::debug!(
        %task_id,
        sessions = session_ids.len(),
        session_records = session_record_ids.len(),
        schedule_entries = schedule_entry_ids.len(),
        "Collected cascade dependents"
    );

    // 3. Delete dependents, records before the sessions they point at
    stores
        .session_records
        .delete_by_parent_id(tx, task_id)
        .await?;
    stores.sessions.delete_by_parent_id(tx, task_id).await?;
    stores
        .schedule_entries
        .delete_by_parent_id(tx, task_id)
        .await?;

    // 4. The task itself
    if !stores.tasks.delete(tx, task_id).await? {
        return Err(MutationError::not_found(ResourceKind::Task, task_id));
    }

    Ok(CascadeSummary {
        task_id,
        session_ids,
        session_record_ids,
        schedule_entry_ids,
    })
}
