//! Executor trait definitions

use async_trait::async_trait;
use fleet_core::{ClusterNode, FleetResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body sent to a node's `/execute` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutePayload {
    pub workflow_id: String,
    pub yaml: String,
    pub user_limits: PayloadLimits,
    pub repository_url: String,
    pub branch: String,
    pub env: BTreeMap<String, String>,
}

/// Resource ceilings the node should enforce on the job
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayloadLimits {
    pub cores: u32,
    #[serde(rename = "memoryGB")]
    pub memory_gb: f64,
}

/// Something that can start a job on a cluster node
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Hand `payload` to `node`.
    ///
    /// Fails with [`fleet_core::FleetError::Dispatch`] carrying a message
    /// suitable for returning to the submitter.
    async fn execute(&self, node: &ClusterNode, payload: &ExecutePayload) -> FleetResult<()>;

    /// Get the executor name
    fn name(&self) -> &'static str;
}
