//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, timestamps, errors)
//! - `tracking` - Tasks, sessions, session records, and schedule entries
//! - `notification` - Change events and the notification type registry

pub mod foundation;
pub mod notification;
pub mod tracking;
