//! Node capacity estimation
//!
//! Nodes do not report their size, so totals are guessed from capability
//! tags. This is a coarse stand-in for real telemetry; scoring only depends
//! on [`estimate`], so swapping in reported figures touches nothing else.

use fleet_core::ClusterNode;

/// Cores assumed when a node carries no CPU size tag
pub const DEFAULT_CORES: f64 = 32.0;
/// Memory assumed when a node carries no memory size tag
pub const DEFAULT_MEMORY_GB: f64 = 64.0;

/// Estimated size of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeCapacity {
    pub cores: f64,
    pub memory_gb: f64,
}

/// Estimate total cores and memory from capability tags
pub fn estimate(node: &ClusterNode) -> NodeCapacity {
    let cores = if node.has_capability("high-cpu") {
        64.0
    } else if node.has_capability("medium-cpu") {
        32.0
    } else if node.has_capability("low-cpu") {
        16.0
    } else {
        DEFAULT_CORES
    };

    let memory_gb = if node.has_capability("high-memory") {
        128.0
    } else if node.has_capability("medium-memory") {
        64.0
    } else if node.has_capability("low-memory") {
        32.0
    } else {
        DEFAULT_MEMORY_GB
    };

    NodeCapacity { cores, memory_gb }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with(tags: &[&str]) -> ClusterNode {
        tags.iter().fold(
            ClusterNode::new("n", "n", "http://localhost"),
            |node, tag| node.with_capability(*tag),
        )
    }

    #[test]
    fn test_defaults_without_tags() {
        let capacity = estimate(&node_with(&[]));
        assert_eq!(capacity.cores, 32.0);
        assert_eq!(capacity.memory_gb, 64.0);
    }

    #[test]
    fn test_size_tags() {
        assert_eq!(estimate(&node_with(&["high-cpu"])).cores, 64.0);
        assert_eq!(estimate(&node_with(&["low-cpu"])).cores, 16.0);
        assert_eq!(estimate(&node_with(&["high-memory"])).memory_gb, 128.0);
        assert_eq!(estimate(&node_with(&["low-memory"])).memory_gb, 32.0);
    }

    #[test]
    fn test_largest_tag_wins() {
        let capacity = estimate(&node_with(&["low-cpu", "high-cpu"]));
        assert_eq!(capacity.cores, 64.0);
    }
}
