//! fleet-core: Core types for the fleet scheduler
//!
//! This crate provides the fundamental types used throughout fleet:
//! - Cluster node, resource request and scheduling decision types
//! - Scheduled workflow metadata
//! - Subscription tier policy
//! - Configuration types
//! - Error handling

pub mod config;
pub mod error;
pub mod model;
pub mod tier;

pub use config::*;
pub use error::*;
pub use model::*;
pub use tier::*;
