//! Per-node scoring
//!
//! A score of exactly 0 is a veto: the job cannot fit on the node. Any
//! positive score is a preference, higher meaning more headroom and less
//! load.

use fleet_core::{ClusterNode, ResourceRequirements, GPU_CAPABILITY};

use crate::capacity;

const BASE_SCORE: f64 = 100.0;
const FULL_NODE_PENALTY: f64 = 50.0;
const HEADROOM_WEIGHT: f64 = 30.0;
const USAGE_WEIGHT: f64 = 0.2;
const JOB_RATIO_WEIGHT: f64 = 20.0;
const GPU_BONUS: f64 = 10.0;

/// Score `node` for a job needing `requirements`
pub fn score_cluster(node: &ClusterNode, requirements: &ResourceRequirements) -> f64 {
    let total = capacity::estimate(node);

    let available_cores = total.cores * (1.0 - node.cpu_usage_pct / 100.0);
    let available_memory_gb = total.memory_gb * (1.0 - node.memory_usage_pct / 100.0);

    let requested_cores = f64::from(requirements.cores);
    let requested_memory_gb = requirements.memory_gb();

    if available_cores < requested_cores || available_memory_gb < requested_memory_gb {
        return 0.0;
    }

    let has_gpu = node.has_capability(GPU_CAPABILITY);
    if requirements.requires_gpu && !has_gpu {
        return 0.0;
    }

    let mut score = BASE_SCORE;

    // A full node may drain before the job starts, so this does not veto.
    if node.active_jobs >= node.max_jobs {
        score -= FULL_NODE_PENALTY;
    }

    let core_headroom = (available_cores - requested_cores) / total.cores;
    let memory_headroom = (available_memory_gb - requested_memory_gb) / total.memory_gb;
    score += HEADROOM_WEIGHT * core_headroom + HEADROOM_WEIGHT * memory_headroom;

    score -= USAGE_WEIGHT * node.cpu_usage_pct + USAGE_WEIGHT * node.memory_usage_pct;
    score -= JOB_RATIO_WEIGHT * node.job_ratio();

    if requirements.requires_gpu {
        score += GPU_BONUS;
    }

    score.max(0.0)
}
