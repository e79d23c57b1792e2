//! In-memory persistence adapter.
//!
//! Used by the test suite and for running the service without Postgres.
//! Transaction semantics match the Postgres adapter closely enough that the
//! same handler tests hold against both.

mod database;
mod store;

pub use database::{MemoryDatabase, MemoryResource, MemoryTables, MemoryTx};
pub use store::MemoryStore;
