//! PostgreSQL store for session records.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::foundation::{DomainError, SessionId, SessionRecordId, TaskId};
use crate::domain::tracking::{SessionRecord, SessionRecordDraft};
use crate::ports::EntityStore;

use super::{db_error, timestamp_column, PgTx};

const COLUMNS: &str = "id, session_id, task_id, duration_secs, recorded_at";

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSessionRecordStore;

#[async_trait]
impl EntityStore<PgTx, SessionRecord> for PostgresSessionRecordStore {
    async fn insert(
        &self,
        tx: &mut PgTx,
        draft: SessionRecordDraft,
    ) -> Result<SessionRecord, DomainError> {
        let row = sqlx::query(&format!(
            "INSERT INTO session_records (session_id, task_id, duration_secs, recorded_at) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        ))
        .bind(draft.session_id.map(|id| id.value()))
        .bind(draft.task_id.map(|id| id.value()))
        .bind(draft.duration_secs)
        .bind(draft.recorded_at.as_datetime())
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error("Failed to insert session record"))?;

        row_to_session_record(&row)
    }

    async fn find_by_id(
        &self,
        tx: &mut PgTx,
        id: SessionRecordId,
    ) -> Result<Option<SessionRecord>, DomainError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM session_records WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error("Failed to fetch session record"))?;

        row.as_ref().map(row_to_session_record).transpose()
    }

    async fn update(
        &self,
        tx: &mut PgTx,
        record: &SessionRecord,
    ) -> Result<Option<SessionRecord>, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE session_records SET session_id = $2, task_id = $3, duration_secs = $4, \
             recorded_at = $5 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(record.id.value())
        .bind(record.session_id.map(|id| id.value()))
        .bind(record.task_id.map(|id| id.value()))
        .bind(record.duration_secs)
        .bind(record.recorded_at.as_datetime())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("Failed to update session record"))?;

        row.as_ref().map(row_to_session_record).transpose()
    }

    async fn exists(&self, tx: &mut PgTx, id: SessionRecordId) -> Result<bool, DomainError> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM session_records WHERE id = $1)")
                .bind(id.value())
                .fetch_one(&mut **tx)
                .await
                .map_err(db_error("Failed to check session record existence"))?;

        Ok(result.0)
    }

    async fn delete(&self, tx: &mut PgTx, id: SessionRecordId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM session_records WHERE id = $1")
            .bind(id.value())
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to delete session record"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_ids_by_parent_id(
        &self,
        tx: &mut PgTx,
        task_id: TaskId,
    ) -> Result<Vec<SessionRecordId>, DomainError> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM session_records WHERE task_id = $1 ORDER BY id")
                .bind(task_id.value())
                .fetch_all(&mut **tx)
                .await
                .map_err(db_error("Failed to list session records for task"))?;

        Ok(ids.into_iter().map(SessionRecordId::new).collect())
    }

    async fn delete_by_parent_id(&self, tx: &mut PgTx, task_id: TaskId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM session_records WHERE task_id = $1")
            .bind(task_id.value())
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to delete session records for task"))?;

        Ok(result.rows_affected())
    }
}

fn row_to_session_record(row: &PgRow) -> Result<SessionRecord, DomainError> {
    let id: i64 = row
        .try_get("id")
        .map_err(db_error("Failed to read session record id"))?;
    let session_id: Option<i64> = row
        .try_get("session_id")
        .map_err(db_error("Failed to read session record session_id"))?;
    let task_id: Option<i64> = row
        .try_get("task_id")
        .map_err(db_error("Failed to read session record task_id"))?;

    Ok(SessionRecord {
        id: SessionRecordId::new(id),
        session_id: session_id.map(SessionId::new),
        task_id: task_id.map(TaskId::new),
        duration_secs: row
            .try_get("duration_secs")
            .map_err(db_error("Failed to read session record duration"))?,
        recorded_at: timestamp_column(row, "recorded_at")?,
    })
}
