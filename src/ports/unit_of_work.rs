//! UnitOfWork port - explicit transaction boundaries.
//!
//! Every store call made with the same `Tx` value runs in the same database
//! transaction. Nothing is visible to other transactions until `commit`
//! returns, and `rollback` discards every write made through `Tx`.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Port for opening and finishing transactions.
///
/// Implementations must ensure:
/// - writes made through a `Tx` are invisible until commit
/// - dropping a `Tx` without committing behaves like a rollback
#[async_trait]
pub trait UnitOfWork: Send + Sync + 'static {
    /// Adapter-specific transaction handle threaded through store calls.
    type Tx: Send + 'static;

    async fn begin(&self) -> Result<Self::Tx, DomainError>;

    async fn commit(&self, tx: Self::Tx) -> Result<(), DomainError>;

    async fn rollback(&self, tx: Self::Tx) -> Result<(), DomainError>;
}
