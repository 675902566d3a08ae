//! Cluster node, job request and scheduled workflow type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Capability tag advertised by nodes that can run GPU jobs
pub const GPU_CAPABILITY: &str = "gpu";

/// A member of the fleet able to execute jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Unique node identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Base URL of the node's execution API
    pub url: String,
    /// Current reachability
    pub status: NodeStatus,
    /// Capability tags (e.g. "gpu", "high-cpu", "medium-memory")
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    /// CPU usage percentage (0-100)
    #[serde(default)]
    pub cpu_usage_pct: f64,
    /// Memory usage percentage (0-100)
    #[serde(default)]
    pub memory_usage_pct: f64,
    /// Jobs currently running on the node
    #[serde(default)]
    pub active_jobs: u32,
    /// Job-count ceiling of the node
    #[serde(default = "default_max_jobs")]
    pub max_jobs: u32,
}

fn default_max_jobs() -> u32 {
    10
}

impl ClusterNode {
    /// Create an idle online node with no capability tags
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            status: NodeStatus::Online,
            capabilities: BTreeSet::new(),
            cpu_usage_pct: 0.0,
            memory_usage_pct: 0.0,
            active_jobs: 0,
            max_jobs: default_max_jobs(),
        }
    }

    /// Add a capability tag
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    /// Check whether the node is accepting work
    pub fn is_online(&self) -> bool {
        self.status == NodeStatus::Online
    }

    /// Check whether the node advertises a capability tag
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Fraction of the job-count ceiling in use, 0 when the node has no ceiling
    pub fn job_ratio(&self) -> f64 {
        if self.max_jobs == 0 {
            0.0
        } else {
            f64::from(self.active_jobs) / f64::from(self.max_jobs)
        }
    }
}

/// Node reachability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Online => write!(f, "online"),
            NodeStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Resources a job needs from the node it is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceRequirements {
    /// CPU cores
    pub cores: u32,
    /// Memory in megabytes
    pub memory_mb: u64,
    /// Whether the job needs a GPU
    #[serde(default)]
    pub requires_gpu: bool,
}

impl ResourceRequirements {
    /// Create CPU-only requirements
    pub fn new(cores: u32, memory_mb: u64) -> Self {
        Self {
            cores,
            memory_mb,
            requires_gpu: false,
        }
    }

    /// Memory in gigabytes (fractional)
    pub fn memory_gb(&self) -> f64 {
        self.memory_mb as f64 / 1024.0
    }
}

/// Outcome of a placement attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingDecision {
    /// Chosen node, if any
    pub cluster: Option<ClusterNode>,
    /// Whether the job can run
    pub can_run: bool,
    /// Human-readable explanation
    pub reason: String,
}

impl SchedulingDecision {
    /// A successful placement on `node`
    pub fn placed(node: ClusterNode, reason: impl Into<String>) -> Self {
        Self {
            cluster: Some(node),
            can_run: true,
            reason: reason.into(),
        }
    }

    /// A failed placement
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            cluster: None,
            can_run: false,
            reason: reason.into(),
        }
    }
}

/// A job submitted for execution somewhere in the fleet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRequest {
    /// Workflow identifier; generated when absent
    #[serde(default)]
    pub workflow_id: Option<String>,
    /// Raw workflow definition
    pub workflow_definition: String,
    /// Clone URL of the repository
    #[serde(default)]
    pub repository_url: String,
    /// Branch to run against
    #[serde(default)]
    pub branch: String,
    /// Environment variables for the job
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Requested CPU cores
    pub cores: u32,
    /// Requested memory in megabytes
    pub memory_mb: u64,
}

/// Result reported back to whoever submitted a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Whether the node accepted the job
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Node the job was sent to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
}

impl JobOutcome {
    /// Job accepted by `cluster_id`
    pub fn accepted(message: impl Into<String>, cluster_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            cluster_id: Some(cluster_id.into()),
        }
    }

    /// Job not scheduled
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            cluster_id: None,
        }
    }
}

/// A recurring cron trigger for one workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledWorkflow {
    /// Composite key, see [`schedule_key`]
    pub id: String,
    /// Repository owning the workflow
    pub repository_id: String,
    /// Path of the workflow file inside the repository
    pub workflow_path: String,
    /// Raw workflow definition submitted on each firing
    pub workflow_definition: String,
    /// Cron expression as written in the workflow
    pub cron_expression: String,
    /// Whether the timer is running
    pub enabled: bool,
    /// Last time the trigger fired
    pub last_run: Option<DateTime<Utc>>,
    /// Next time the trigger is due
    pub next_run: Option<DateTime<Utc>>,
}

impl ScheduledWorkflow {
    /// Create an enabled schedule that has never fired
    pub fn new(
        repository_id: impl Into<String>,
        workflow_path: impl Into<String>,
        workflow_definition: impl Into<String>,
        cron_expression: impl Into<String>,
    ) -> Self {
        let repository_id = repository_id.into();
        let workflow_path = workflow_path.into();
        let cron_expression = cron_expression.into();
        Self {
            id: schedule_key(&repository_id, &workflow_path, &cron_expression),
            repository_id,
            workflow_path,
            workflow_definition: workflow_definition.into(),
            cron_expression,
            enabled: true,
            last_run: None,
            next_run: None,
        }
    }
}

/// Composite key identifying one recurring trigger
pub fn schedule_key(repository_id: &str, workflow_path: &str, cron_expression: &str) -> String {
    format!("{}:{}:{}", repository_id, workflow_path, cron_expression)
}

/// Counts over the schedule registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
}
