//! Command handlers.
//!
//! Every handler runs its store calls through a [`TransactionRunner`] and
//! only talks to the [`ChangePublisher`] after the transaction commits.
//!
//! [`TransactionRunner`]: crate::application::TransactionRunner
//! [`ChangePublisher`]: crate::ports::ChangePublisher

mod delete_task_cascade;
mod resource_mutations;

pub use delete_task_cascade::{CascadeSummary, DeleteTaskCascadeCommand, DeleteTaskCascadeHandler};
pub use resource_mutations::{CreateResourceHandler, DeleteResourceHandler, UpdateResourceHandler};
