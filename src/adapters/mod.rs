//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Entity stores and transactions on PostgreSQL
//! - `memory` - Entity stores and transactions held in process
//! - `events` - Change publishing through a bounded queue and worker pool
//! - `websocket` - Subscriber hub and the change stream endpoint

pub mod events;
pub mod memory;
pub mod postgres;
pub mod websocket;

pub use events::{
    CapturingPublisher, DeliveryPoolConfig, DeliveryWorkerPool, QueuedChangePublisher,
    RecordingBroadcaster,
};
pub use memory::MemoryDatabase;
pub use postgres::{postgres_stores, PgTx, PostgresUnitOfWork};
pub use websocket::{websocket_router, SubscriberHub, WebSocketState};
