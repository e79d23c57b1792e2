//! WebSocket adapters for live change notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      DeliveryWorkerPool                             │
//! │   - Drains the bounded change queue                                 │
//! │   - Encodes envelopes, hands them off in submission order           │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ Broadcaster::publish_to_topic
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      SubscriberHub                                  │
//! │   Topic: changes                                                    │
//! │   ├── client-a                                                      │
//! │   ├── client-b                                                      │
//! │   └── client-c                                                      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ per-write timeout
//!                                     ▼
//!                               WebSocket clients
//! ```
//!
//! # Components
//!
//! - [`messages`] - Control frames around the change stream
//! - [`hub`] - Topic registry and broadcast fan-out
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod handler;
pub mod hub;
pub mod messages;

pub use handler::{send_with_timeout, websocket_router, ws_handler, WebSocketState, WriteError};
pub use hub::{ClientId, SubscriberHub};
pub use messages::{ClientMessage, ConnectedMessage, LaggedMessage, PongMessage, ServerMessage};
