//! Cluster registry
//!
//! The registry owns node state. The scheduler only ever reads a snapshot,
//! taken fresh for each decision.

use fleet_core::{ClusterNode, FleetError, FleetResult, NodeStatus};
use std::sync::RwLock;
use tracing::debug;

/// Source of the current fleet membership and load
pub trait ClusterRegistry: Send + Sync {
    /// Snapshot of every known node, in registration order
    fn list_nodes(&self) -> Vec<ClusterNode>;
}

/// Registry holding nodes in memory
pub struct InMemoryRegistry {
    nodes: RwLock<Vec<ClusterNode>>,
}

impl InMemoryRegistry {
    /// Create a registry seeded with `nodes`
    pub fn new(nodes: Vec<ClusterNode>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Insert a node, or replace the node with the same id in place
    pub fn upsert(&self, node: ClusterNode) {
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        debug!(cluster_id = %node.id, status = %node.status, "Registered cluster");
        match nodes.iter_mut().find(|n| n.id == node.id) {
            Some(existing) => *existing = node,
            None => nodes.push(node),
        }
    }

    /// Remove a node; returns whether it was present
    pub fn remove(&self, id: &str) -> bool {
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        let before = nodes.len();
        nodes.retain(|n| n.id != id);
        before != nodes.len()
    }

    /// Mark a node online or offline
    pub fn set_status(&self, id: &str, status: NodeStatus) -> FleetResult<()> {
        self.update(id, |node| node.status = status)
    }

    /// Record a load report from a node
    pub fn report_load(
        &self,
        id: &str,
        cpu_usage_pct: f64,
        memory_usage_pct: f64,
        active_jobs: u32,
    ) -> FleetResult<()> {
        self.update(id, |node| {
            node.cpu_usage_pct = cpu_usage_pct.clamp(0.0, 100.0);
            node.memory_usage_pct = memory_usage_pct.clamp(0.0, 100.0);
            node.active_jobs = active_jobs;
        })
    }

    fn update(&self, id: &str, f: impl FnOnce(&mut ClusterNode)) -> FleetResult<()> {
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        let node = nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| FleetError::NotFound(format!("cluster {}", id)))?;
        f(node);
        Ok(())
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ClusterRegistry for InMemoryRegistry {
    fn list_nodes(&self) -> Vec<ClusterNode> {
        self.nodes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
