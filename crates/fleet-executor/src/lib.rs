//! fleet-executor: hands scheduled jobs to cluster nodes
//!
//! This crate provides the seam between placement and execution:
//! - The [`NodeExecutor`] trait implemented by anything that can run a job on a node
//! - An HTTP implementation calling the node's `/execute` endpoint

pub mod http;
pub mod traits;

pub use http::HttpExecutor;
pub use traits::{ExecutePayload, NodeExecutor, PayloadLimits};
