//! Fleet-wide statistics

use fleet_core::ClusterNode;
use serde::{Deserialize, Serialize};

/// Aggregate view over a registry snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterStats {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    /// Jobs running across online nodes
    pub active_jobs: u64,
    /// Sum of job ceilings across online nodes
    pub job_capacity: u64,
    /// Mean CPU usage of online nodes
    pub avg_cpu_usage_pct: f64,
    /// Mean memory usage of online nodes
    pub avg_memory_usage_pct: f64,
}

/// Fold `nodes` into a [`ClusterStats`]
pub fn cluster_stats(nodes: &[ClusterNode]) -> ClusterStats {
    let online: Vec<&ClusterNode> = nodes.iter().filter(|n| n.is_online()).collect();

    ClusterStats {
        total: nodes.len(),
        online: online.len(),
        offline: nodes.len() - online.len(),
        active_jobs: online.iter().map(|n| u64::from(n.active_jobs)).sum(),
        job_capacity: online.iter().map(|n| u64::from(n.max_jobs)).sum(),
        avg_cpu_usage_pct: mean(&online, |n| n.cpu_usage_pct),
        avg_memory_usage_pct: mean(&online, |n| n.memory_usage_pct),
    }
}

fn mean(nodes: &[&ClusterNode], f: impl Fn(&ClusterNode) -> f64) -> f64 {
    if nodes.is_empty() {
        return 0.0;
    }
    nodes.iter().map(|n| f(*n)).sum::<f64>() / nodes.len() as f64
}
