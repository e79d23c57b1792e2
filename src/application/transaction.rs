//! Explicit transaction wrapper.
//!
//! `run(work, on_commit)` executes the store calls in `work` inside one
//! transaction and only calls `on_commit` once that transaction has
//! committed. Change events are built in `on_commit`, so a failed or
//! rolled-back mutation can never produce one.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::ports::UnitOfWork;

use super::MutationError;

/// Runs units of work against a [`UnitOfWork`] adapter.
pub struct TransactionRunner<U: UnitOfWork> {
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> Clone for TransactionRunner<U> {
    fn clone(&self) -> Self {
        Self {
            unit_of_work: Arc::clone(&self.unit_of_work),
        }
    }
}

impl<U: UnitOfWork> TransactionRunner<U> {
    pub fn new(unit_of_work: Arc<U>) -> Self {
        Self { unit_of_work }
    }

    /// Run `work` in a fresh transaction, then `on_commit` with its result.
    ///
    /// Any error from `work` rolls the transaction back and is returned
    /// unchanged. A failed rollback is logged; the original error still wins.
    /// A failed commit is returned as a store error and `on_commit` is
    /// skipped.
    pub async fn run<R, O, W, C, F>(&self, work: W, on_commit: C) -> Result<O, MutationError>
    where
        W: for<'t> FnOnce(&'t mut U::Tx) -> BoxFuture<'t, Result<R, MutationError>>,
        C: FnOnce(R) -> F,
        F: Future<Output = O>,
    {
        let mut tx = self.unit_of_work.begin().await?;

        let value = match work(&mut tx).await {
            Ok(value) => value,
            Err(err) => {
                if let Err(rollback_err) = self.unit_of_work.rollback(tx).await {
                    tracing::error!(
                        error = %rollback_err,
                        cause = %err,
                        "Transaction rollback failed"
                    );
                }
                return Err(err);
            }
        };

        self.unit_of_work.commit(tx).await?;

        Ok(on_commit(value).await)
    }
}
