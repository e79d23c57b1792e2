//! PostgreSQL implementation of UnitOfWork.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::foundation::DomainError;
use crate::ports::UnitOfWork;

use super::db_error;

/// Transaction handle threaded through every Postgres store call.
pub type PgTx = Transaction<'static, Postgres>;

/// Opens transactions on a connection pool.
///
/// A `PgTx` dropped without commit is rolled back by `sqlx`.
#[derive(Clone)]
pub struct PostgresUnitOfWork {
    pool: PgPool,
}

impl PostgresUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))
    }

    async fn commit(&self, tx: PgTx) -> Result<(), DomainError> {
        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))
    }

    async fn rollback(&self, tx: PgTx) -> Result<(), DomainError> {
        tx.rollback()
            .await
            .map_err(db_error("Failed to roll back transaction"))
    }
}
