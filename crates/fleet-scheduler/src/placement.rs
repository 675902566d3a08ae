//! Job placement decisions
//!
//! Placement is greedy and does not reserve capacity. Two decisions made
//! before a node reports its new `active_jobs` can both pick that node.

use fleet_core::{ClusterNode, ResourceRequirements, SchedulingDecision};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

use crate::registry::ClusterRegistry;
use crate::scoring::score_cluster;

/// Strategy for choosing a node from a registry snapshot
pub trait PlacementStrategy: Send + Sync {
    /// Pick a node for `requirements` among `nodes`
    fn place(&self, nodes: &[ClusterNode], requirements: &ResourceRequirements)
        -> SchedulingDecision;
}

/// Picks the online node with the highest [`score_cluster`] result
pub struct ScoredPlacement;

impl PlacementStrategy for ScoredPlacement {
    fn place(
        &self,
        nodes: &[ClusterNode],
        requirements: &ResourceRequirements,
    ) -> SchedulingDecision {
        let online: Vec<&ClusterNode> = nodes.iter().filter(|n| n.is_online()).collect();

        if online.is_empty() {
            return SchedulingDecision::rejected("No clusters available. Please try again later.");
        }

        let mut candidates: Vec<(&ClusterNode, f64)> = online
            .into_iter()
            .map(|node| (node, score_cluster(node, requirements)))
            .inspect(|(node, score)| debug!(cluster_id = %node.id, score = *score, "Scored cluster"))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        if candidates.is_empty() {
            return SchedulingDecision::rejected(format!(
                "No cluster can satisfy {} cores / {}MB of memory",
                requirements.cores, requirements.memory_mb
            ));
        }

        // Stable: equal scores keep registry order.
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let (best, score) = candidates[0];
        SchedulingDecision::placed(
            best.clone(),
            format!("Selected cluster {} (score {:.1})", best.name, score),
        )
    }
}

/// Places jobs on nodes from a cluster registry
pub struct PlacementEngine {
    /// Source of node snapshots
    registry: Arc<dyn ClusterRegistry>,
    /// Placement strategy
    strategy: Arc<dyn PlacementStrategy>,
}

impl PlacementEngine {
    /// Create a placement engine using [`ScoredPlacement`]
    pub fn new(registry: Arc<dyn ClusterRegistry>) -> Self {
        Self::with_strategy(registry, Arc::new(ScoredPlacement))
    }

    /// Create a placement engine with a custom strategy
    pub fn with_strategy(
        registry: Arc<dyn ClusterRegistry>,
        strategy: Arc<dyn PlacementStrategy>,
    ) -> Self {
        Self { registry, strategy }
    }

    /// Choose the best node for `requirements` from a fresh registry snapshot
    pub fn find_suitable_cluster(&self, requirements: &ResourceRequirements) -> SchedulingDecision {
        let nodes = self.registry.list_nodes();
        let decision = self.strategy.place(&nodes, requirements);

        match &decision.cluster {
            Some(node) => info!(
                cluster_id = %node.id,
                cores = requirements.cores,
                memory_mb = requirements.memory_mb,
                "Placement decided"
            ),
            None => info!(
                cores = requirements.cores,
                memory_mb = requirements.memory_mb,
                reason = %decision.reason,
                "No placement"
            ),
        }

        decision
    }

    /// Get the registry backing this engine
    pub fn registry(&self) -> &Arc<dyn ClusterRegistry> {
        &self.registry
    }
}
