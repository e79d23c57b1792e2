//! PostgreSQL store for tasks.

use std::convert::Infallible;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::foundation::{DomainError, TaskId, Timestamp};
use crate::domain::tracking::{Task, TaskDraft};
use crate::ports::EntityStore;

use super::{db_error, timestamp_column, PgTx};

const COLUMNS: &str = "id, title, description, created_at, updated_at";

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresTaskStore;

#[async_trait]
impl EntityStore<PgTx, Task> for PostgresTaskStore {
    async fn insert(&self, tx: &mut PgTx, draft: TaskDraft) -> Result<Task, DomainError> {
        let now = Timestamp::now();
        let row = sqlx::query(&format!(
            "INSERT INTO tasks (title, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $3) RETURNING {COLUMNS}"
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(now.as_datetime())
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error("Failed to insert task"))?;

        row_to_task(&row)
    }

    async fn find_by_id(&self, tx: &mut PgTx, id: TaskId) -> Result<Option<Task>, DomainError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error("Failed to fetch task"))?;

        row.as_ref().map(row_to_task).transpose()
    }

    async fn update(&self, tx: &mut PgTx, task: &Task) -> Result<Option<Task>, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE tasks SET title = $2, description = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(task.id.value())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.updated_at.as_datetime())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("Failed to update task"))?;

        row.as_ref().map(row_to_task).transpose()
    }

    /// Locks the row until the transaction ends, so no dependent can be
    /// attached to a task while it is being cascaded.
    async fn exists(&self, tx: &mut PgTx, id: TaskId) -> Result<bool, DomainError> {
        let row = sqlx::query("SELECT id FROM tasks WHERE id = $1 FOR UPDATE")
            .bind(id.value())
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error("Failed to check task existence"))?;

        Ok(row.is_some())
    }

    async fn delete(&self, tx: &mut PgTx, id: TaskId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.value())
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to delete task"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_ids_by_parent_id(
        &self,
        _tx: &mut PgTx,
        parent_id: Infallible,
    ) -> Result<Vec<TaskId>, DomainError> {
        match parent_id {}
    }

    async fn delete_by_parent_id(
        &self,
        _tx: &mut PgTx,
        parent_id: Infallible,
    ) -> Result<u64, DomainError> {
        match parent_id {}
    }
}

fn row_to_task(row: &PgRow) -> Result<Task, DomainError> {
    Ok(Task {
        id: TaskId::new(row.try_get("id").map_err(db_error("Failed to read task id"))?),
        title: row
            .try_get("title")
            .map_err(db_error("Failed to read task title"))?,
        description: row
            .try_get("description")
            .map_err(db_error("Failed to read task description"))?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}
