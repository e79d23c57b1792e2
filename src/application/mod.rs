//! Application layer - mutation handlers and the transaction boundary.
//!
//! Handlers compose store primitives inside one transaction and publish a
//! single change event once that transaction has committed.

mod errors;
pub mod handlers;
mod notify;
mod services;
mod transaction;

pub use errors::MutationError;
pub use handlers::{
    CascadeSummary, CreateResourceHandler, DeleteResourceHandler, DeleteTaskCascadeCommand,
    DeleteTaskCascadeHandler, UpdateResourceHandler,
};
pub use services::TrackingServices;
pub use transaction::TransactionRunner;
