//! Job dispatch
//!
//! Checks a request against its tier, places it, and hands it to the chosen
//! node. Nothing here retries: a retry on a stale placement could land on a
//! node that has since filled up, so callers re-submit instead.

use fleet_core::{
    limits_for, validate_resource_request, FleetError, JobOutcome, JobRequest,
    ResourceRequirements, SchedulingDecision, UserLimits,
};
use fleet_executor::{ExecutePayload, NodeExecutor, PayloadLimits};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::placement::PlacementEngine;
use crate::registry::ClusterRegistry;
use crate::telemetry::{cluster_stats, ClusterStats};

/// Validates, places and sends jobs
pub struct JobDispatcher {
    /// Placement engine
    placement: PlacementEngine,
    /// Executor used to reach nodes
    executor: Arc<dyn NodeExecutor>,
}

impl JobDispatcher {
    /// Create a new dispatcher
    pub fn new(placement: PlacementEngine, executor: Arc<dyn NodeExecutor>) -> Self {
        info!(executor = executor.name(), "Job dispatcher initialized");
        Self {
            placement,
            executor,
        }
    }

    /// Schedule `request` on behalf of a user on `tier`
    pub async fn schedule_job(&self, request: &JobRequest, tier: &str) -> JobOutcome {
        let limits = limits_for(tier);
        let requirements = clamp_to_limits(request, &limits);

        let validation = validate_resource_request(&requirements, &limits);
        if !validation.valid {
            let reason = validation.reason.unwrap_or_default();
            debug!(tier = %limits.tier, reason = %reason, "Request exceeds tier limits");
            return JobOutcome::failed(reason);
        }

        let decision = self.placement.find_suitable_cluster(&requirements);
        let node = match decision {
            SchedulingDecision {
                cluster: Some(node),
                can_run: true,
                ..
            } => node,
            other => return JobOutcome::failed(other.reason),
        };

        let workflow_id = request
            .workflow_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let payload = ExecutePayload {
            workflow_id: workflow_id.clone(),
            yaml: request.workflow_definition.clone(),
            user_limits: PayloadLimits {
                cores: requirements.cores,
                memory_gb: requirements.memory_gb(),
            },
            repository_url: request.repository_url.clone(),
            branch: request.branch.clone(),
            env: request.env.clone(),
        };

        match self.executor.execute(&node, &payload).await {
            Ok(()) => {
                info!(
                    workflow_id = %workflow_id,
                    cluster_id = %node.id,
                    "Job dispatched"
                );
                JobOutcome::accepted(format!("Job scheduled on {}", node.name), node.id)
            }
            Err(e) => {
                warn!(
                    workflow_id = %workflow_id,
                    cluster_id = %node.id,
                    error = %e,
                    "Job dispatch failed"
                );
                let message = match e {
                    FleetError::Dispatch(message) => message,
                    other => other.to_string(),
                };
                JobOutcome::failed(message)
            }
        }
    }

    /// Choose a node without dispatching anything
    pub fn find_suitable_cluster(&self, requirements: &ResourceRequirements) -> SchedulingDecision {
        self.placement.find_suitable_cluster(requirements)
    }

    /// Statistics over the current registry snapshot
    pub fn cluster_stats(&self) -> ClusterStats {
        cluster_stats(&self.registry().list_nodes())
    }

    /// Get the registry behind the placement engine
    pub fn registry(&self) -> &Arc<dyn ClusterRegistry> {
        self.placement.registry()
    }
}

/// Requested resources capped at the tier ceiling.
///
/// GPU need is not inferred from the job body, so `requires_gpu` is always false.
fn clamp_to_limits(request: &JobRequest, limits: &UserLimits) -> ResourceRequirements {
    ResourceRequirements {
        cores: request.cores.min(limits.max_cores),
        memory_mb: request.memory_mb.min(limits.max_memory_mb()),
        requires_gpu: false,
    }
}
