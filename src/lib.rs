//! Timekeeper - Task and Time Tracking Service
//!
//! Tasks own sessions, session records and schedule entries. Deleting a task
//! removes everything that belongs to it in one transaction and announces
//! the removal to live subscribers as a single change event.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
