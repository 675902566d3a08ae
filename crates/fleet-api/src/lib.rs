//! fleet-api: REST API server for fleet
//!
//! This crate exposes the scheduler over HTTP:
//! - Job submission and tier limits
//! - Cron schedule management
//! - Cluster registration and statistics

pub mod rest;

pub use rest::{create_router, AppState};
