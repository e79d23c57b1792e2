//! PostgreSQL store for sessions.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::foundation::{DomainError, SessionId, TaskId};
use crate::domain::tracking::{Session, SessionDraft};
use crate::ports::EntityStore;

use super::{db_error, optional_timestamp_column, timestamp_column, PgTx};

const COLUMNS: &str = "id, task_id, started_at, ended_at";

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSessionStore;

#[async_trait]
impl EntityStore<PgTx, Session> for PostgresSessionStore {
    async fn insert(&self, tx: &mut PgTx, draft: SessionDraft) -> Result<Session, DomainError> {
        let row = sqlx::query(&format!(
            "INSERT INTO sessions (task_id, started_at, ended_at) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(draft.task_id.map(|id| id.value()))
        .bind(draft.started_at.as_datetime())
        .bind(draft.ended_at.map(|t| *t.as_datetime()))
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error("Failed to insert session"))?;

        row_to_session(&row)
    }

    async fn find_by_id(
        &self,
        tx: &mut PgTx,
        id: SessionId,
    ) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM sessions WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error("Failed to fetch session"))?;

        row.as_ref().map(row_to_session).transpose()
    }

    async fn update(&self, tx: &mut PgTx, session: &Session) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE sessions SET task_id = $2, started_at = $3, ended_at = $4 \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(session.id.value())
        .bind(session.task_id.map(|id| id.value()))
        .bind(session.started_at.as_datetime())
        .bind(session.ended_at.map(|t| *t.as_datetime()))
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("Failed to update session"))?;

        row.as_ref().map(row_to_session).transpose()
    }

    async fn exists(&self, tx: &mut PgTx, id: SessionId) -> Result<bool, DomainError> {
        let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM sessions WHERE id = $1)")
            .bind(id.value())
            .fetch_one(&mut **tx)
            .await
            .map_err(db_error("Failed to check session existence"))?;

        Ok(result.0)
    }

    async fn delete(&self, tx: &mut PgTx, id: SessionId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id.value())
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to delete session"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_ids_by_parent_id(
        &self,
        tx: &mut PgTx,
        task_id: TaskId,
    ) -> Result<Vec<SessionId>, DomainError> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM sessions WHERE task_id = $1 ORDER BY id")
                .bind(task_id.value())
                .fetch_all(&mut **tx)
                .await
                .map_err(db_error("Failed to list sessions for task"))?;

        Ok(ids.into_iter().map(SessionId::new).collect())
    }

    async fn delete_by_parent_id(&self, tx: &mut PgTx, task_id: TaskId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE task_id = $1")
            .bind(task_id.value())
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to delete sessions for task"))?;

        Ok(result.rows_affected())
    }
}

fn row_to_session(row: &PgRow) -> Result<Session, DomainError> {
    let id: i64 = row
        .try_get("id")
        .map_err(db_error("Failed to read session id"))?;
    let task_id: Option<i64> = row
        .try_get("task_id")
        .map_err(db_error("Failed to read session task_id"))?;

    Ok(Session {
        id: SessionId::new(id),
        task_id: task_id.map(TaskId::new),
        started_at: timestamp_column(row, "started_at")?,
        ended_at: optional_timestamp_column(row, "ended_at")?,
    })
}
