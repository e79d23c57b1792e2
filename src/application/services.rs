//! TrackingServices - the mutation surface inbound adapters call.
//!
//! Wires one handler per published mutation against a single unit of work,
//! store set and publisher.

use std::sync::Arc;

use crate::domain::foundation::{SessionId, SessionRecordId, TaskId};
use crate::domain::tracking::{
    Session, SessionDraft, SessionRecord, SessionRecordDraft, Task, TaskDraft,
};
use crate::ports::{ChangePublisher, TrackingStores, UnitOfWork};

use super::handlers::{
    CascadeSummary, CreateResourceHandler, DeleteResourceHandler, DeleteTaskCascadeCommand,
    DeleteTaskCascadeHandler, UpdateResourceHandler,
};
use super::{MutationError, TransactionRunner};

pub struct TrackingServices<U: UnitOfWork> {
    create_task: CreateResourceHandler<U, Task>,
    update_task: UpdateResourceHandler<U, Task>,
    delete_task: DeleteTaskCascadeHandler<U>,
    create_session: CreateResourceHandler<U, Session>,
    delete_session: DeleteResourceHandler<U, Session>,
    create_session_record: CreateResourceHandler<U, SessionRecord>,
    update_session_record: UpdateResourceHandler<U, SessionRecord>,
    delete_session_record: DeleteResourceHandler<U, SessionRecord>,
}

impl<U: UnitOfWork> TrackingServices<U> {
    pub fn new(
        unit_of_work: Arc<U>,
        stores: TrackingStores<U::Tx>,
        publisher: Arc<dyn ChangePublisher>,
    ) -> Self {
        let runner = TransactionRunner::new(unit_of_work);
        Self {
            create_task: CreateResourceHandler::new(
                runner.clone(),
                stores.tasks.clone(),
                publisher.clone(),
            ),
            update_task: UpdateResourceHandler::new(
                runner.clone(),
                stores.tasks.clone(),
                publisher.clone(),
            ),
            delete_task: DeleteTaskCascadeHandler::new(
                runner.clone(),
                stores.clone(),
                publisher.clone(),
            ),
            create_session: CreateResourceHandler::new(
                runner.clone(),
                stores.sessions.clone(),
                publisher.clone(),
            ),
            delete_session: DeleteResourceHandler::new(
                runner.clone(),
                stores.sessions.clone(),
                publisher.clone(),
            ),
            create_session_record: CreateResourceHandler::new(
                runner.clone(),
                stores.session_records.clone(),
                publisher.clone(),
            ),
            update_session_record: UpdateResourceHandler::new(
                runner.clone(),
                stores.session_records.clone(),
                publisher.clone(),
            ),
            delete_session_record: DeleteResourceHandler::new(
                runner,
                stores.session_records,
                publisher,
            ),
        }
    }

    pub async fn create_task(&self, draft: TaskDraft) -> Result<Task, MutationError> {
        self.create_task.handle(draft).await
    }

    pub async fn update_task(&self, task: Task) -> Result<Task, MutationError> {
        self.update_task.handle(task).await
    }

    /// Deletes the task and everything referencing it.
    pub async fn delete_task(&self, task_id: TaskId) -> Result<CascadeSummary, MutationError> {
        self.delete_task
            .handle(DeleteTaskCascadeCommand { task_id })
            .await
    }

    pub async fn create_session(&self, draft: SessionDraft) -> Result<Session, MutationError> {
        self.create_session.handle(draft).await
    }

    pub async fn delete_session(&self, id: SessionId) -> Result<(), MutationError> {
        self.delete_session.handle(id).await
    }

    pub async fn create_session_record(
        &self,
        draft: SessionRecordDraft,
    ) -> Result<SessionRecord, MutationError> {
        self.create_session_record.handle(draft).await
    }

    pub async fn update_session_record(
        &self,
        record: SessionRecord,
    ) -> Result<SessionRecord, MutationError> {
        self.update_session_record.handle(record).await
    }

    pub async fn delete_session_record(&self, id: SessionRecordId) -> Result<(), MutationError> {
        self.delete_session_record.handle(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::CapturingPublisher;
    use crate::adapters::memory::MemoryDatabase;
    use crate::domain::notification::NotificationType;

    #[tokio::test]
    async fn each_mutation_publishes_exactly_one_event() {
        let db = Arc::new(MemoryDatabase::new());
        let publisher = Arc::new(CapturingPublisher::new());
        let services = TrackingServices::new(db.clone(), db.stores(), publisher.clone());

        let mut task = services.create_task(TaskDraft::new("Focus")).await.unwrap();
        task.title = "Deep focus".to_string();
        let task = services.update_task(task).await.unwrap();
        let session = services
            .create_session(SessionDraft::start(Some(task.id)))
            .await
            .unwrap();
        let mut record = services
            .create_session_record(SessionRecordDraft::new(Some(session.id), Some(task.id), 25))
            .await
            .unwrap();
        record.duration_secs = 50;
        let record = services.update_session_record(record).await.unwrap();
        services.delete_session_record(record.id).await.unwrap();
        services.delete_session(session.id).await.unwrap();
        services.delete_task(task.id).await.unwrap();

        let types: Vec<_> = publisher
            .published_events()
            .iter()
            .map(|e| e.notification_type())
            .collect();
        assert_eq!(
            types,
            vec![
                NotificationType::TaskCreate,
                NotificationType::TaskUpdate,
                NotificationType::SessionCreate,
                NotificationType::SessionRecordCreate,
                NotificationType::SessionRecordUpdate,
                NotificationType::SessionRecordDelete,
                NotificationType::SessionDelete,
                NotificationType::TaskDelete,
            ]
        );
    }

    #[tokio::test]
    async fn data_is_present_only_on_create_and_update() {
        let db = Arc::new(MemoryDatabase::new());
        let publisher = Arc::new(CapturingPublisher::new());
        let services = TrackingServices::new(db.clone(), db.stores(), publisher.clone());

        let task = services.create_task(TaskDraft::new("a")).await.unwrap();
        let session = services
            .create_session(SessionDraft::start(Some(task.id)))
            .await
            .unwrap();
        services.delete_session(session.id).await.unwrap();
        services.delete_task(task.id).await.unwrap();

        for event in publisher.published_events() {
            assert_eq!(
                event.data().is_some(),
                event.notification_type().action().carries_data(),
                "{}",
                event.notification_type()
            );
        }
    }
}
