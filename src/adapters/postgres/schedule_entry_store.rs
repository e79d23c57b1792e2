//! PostgreSQL store for schedule entries.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::foundation::{DomainError, ScheduleEntryId, TaskId};
use crate::domain::tracking::{ScheduleEntry, ScheduleEntryDraft};
use crate::ports::EntityStore;

use super::{db_error, timestamp_column, PgTx};

const COLUMNS: &str = "id, task_id, starts_at, ends_at";

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresScheduleEntryStore;

#[async_trait]
impl EntityStore<PgTx, ScheduleEntry> for PostgresScheduleEntryStore {
    async fn insert(
        &self,
        tx: &mut PgTx,
        draft: ScheduleEntryDraft,
    ) -> Result<ScheduleEntry, DomainError> {
        let row = sqlx::query(&format!(
            "INSERT INTO schedule_entries (task_id, starts_at, ends_at) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(draft.task_id.map(|id| id.value()))
        .bind(draft.starts_at.as_datetime())
        .bind(draft.ends_at.as_datetime())
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error("Failed to insert schedule entry"))?;

        row_to_schedule_entry(&row)
    }

    async fn find_by_id(
        &self,
        tx: &mut PgTx,
        id: ScheduleEntryId,
    ) -> Result<Option<ScheduleEntry>, DomainError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM schedule_entries WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error("Failed to fetch schedule entry"))?;

        row.as_ref().map(row_to_schedule_entry).transpose()
    }

    async fn update(
        &self,
        tx: &mut PgTx,
        entry: &ScheduleEntry,
    ) -> Result<Option<ScheduleEntry>, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE schedule_entries SET task_id = $2, starts_at = $3, ends_at = $4 \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(entry.id.value())
        .bind(entry.task_id.map(|id| id.value()))
        .bind(entry.starts_at.as_datetime())
        .bind(entry.ends_at.as_datetime())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("Failed to update schedule entry"))?;

        row.as_ref().map(row_to_schedule_entry).transpose()
    }

    async fn exists(&self, tx: &mut PgTx, id: ScheduleEntryId) -> Result<bool, DomainError> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM schedule_entries WHERE id = $1)")
                .bind(id.value())
                .fetch_one(&mut **tx)
                .await
                .map_err(db_error("Failed to check schedule entry existence"))?;

        Ok(result.0)
    }

    async fn delete(&self, tx: &mut PgTx, id: ScheduleEntryId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM schedule_entries WHERE id = $1")
            .bind(id.value())
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to delete schedule entry"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_ids_by_parent_id(
        &self,
        tx: &mut PgTx,
        task_id: TaskId,
    ) -> Result<Vec<ScheduleEntryId>, DomainError> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM schedule_entries WHERE task_id = $1 ORDER BY id")
                .bind(task_id.value())
                .fetch_all(&mut **tx)
                .await
                .map_err(db_error("Failed to list schedule entries for task"))?;

        Ok(ids.into_iter().map(ScheduleEntryId::new).collect())
    }

    async fn delete_by_parent_id(&self, tx: &mut PgTx, task_id: TaskId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM schedule_entries WHERE task_id = $1")
            .bind(task_id.value())
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to delete schedule entries for task"))?;

        Ok(result.rows_affected())
    }
}

fn row_to_schedule_entry(row: &PgRow) -> Result<ScheduleEntry, DomainError> {
    let id: i64 = row
        .try_get("id")
        .map_err(db_error("Failed to read schedule entry id"))?;
    let task_id: Option<i64> = row
        .try_get("task_id")
        .map_err(db_error("Failed to read schedule entry task_id"))?;

    Ok(ScheduleEntry {
        id: ScheduleEntryId::new(id),
        task_id: task_id.map(TaskId::new),
        starts_at: timestamp_column(row, "starts_at")?,
        ends_at: timestamp_column(row, "ends_at")?,
    })
}
