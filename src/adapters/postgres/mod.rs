//! PostgreSQL adapters - Database implementations for the persistence ports.
//!
//! - `PostgresUnitOfWork` - Opens `sqlx` transactions on a pool
//! - One stateless store per table, all running on the caller's transaction
//!
//! Foreign keys are declared `ON DELETE SET NULL`: the database never
//! cascades on its own, the application decides what a deletion removes.

mod schedule_entry_store;
mod session_record_store;
mod session_store;
mod task_store;
mod unit_of_work;

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::TrackingStores;

pub use schedule_entry_store::PostgresScheduleEntryStore;
pub use session_record_store::PostgresSessionRecordStore;
pub use session_store::PostgresSessionStore;
pub use task_store::PostgresTaskStore;
pub use unit_of_work::{PgTx, PostgresUnitOfWork};

/// Every Postgres store, sharing [`PgTx`].
pub fn postgres_stores() -> TrackingStores<PgTx> {
    TrackingStores {
        tasks: Arc::new(PostgresTaskStore),
        sessions: Arc::new(PostgresSessionStore),
        session_records: Arc::new(PostgresSessionRecordStore),
        schedule_entries: Arc::new(PostgresScheduleEntryStore),
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| DomainError::database(context, e)
}

fn timestamp_column(row: &PgRow, column: &'static str) -> Result<Timestamp, DomainError> {
    row.try_get::<chrono::DateTime<chrono::Utc>, _>(column)
        .map(Timestamp::from_datetime)
        .map_err(db_error("Failed to read timestamp column"))
}

fn optional_timestamp_column(
    row: &PgRow,
    column: &'static str,
) -> Result<Option<Timestamp>, DomainError> {
    row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(column)
        .map(|value| value.map(Timestamp::from_datetime))
        .map_err(db_error("Failed to read timestamp column"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[test]
    fn db_error_keeps_context() {
        let err = db_error("Failed to delete task")(sqlx::Error::RowNotFound);
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.starts_with("Failed to delete task: "));
    }
}
