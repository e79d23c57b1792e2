//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `UnitOfWork` - Opens, commits, and rolls back transactions
//! - `EntityStore` - Per-resource primitives used inside a transaction
//!
//! ## Notification Ports
//!
//! - `ChangePublisher` - Non-blocking hand-off of committed change events
//! - `Broadcaster` - Pub-sub transport that reaches live subscribers

mod broadcaster;
mod change_publisher;
mod entity_store;
mod unit_of_work;

pub use broadcaster::{Broadcaster, DeliveryError};
pub use change_publisher::ChangePublisher;
pub use entity_store::{EntityStore, TrackingStores};
pub use unit_of_work::UnitOfWork;
