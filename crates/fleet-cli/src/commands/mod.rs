//! CLI commands implementation

use anyhow::Result;
use fleet_core::{ClusterNode, JobOutcome, JobRequest, ScheduledWorkflow, SchedulerStats, UserLimits};
use serde::{Deserialize, Serialize};

/// API client for communicating with the daemon
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Schedule report from API
#[derive(Debug, Deserialize)]
pub struct ScheduleReport {
    pub scheduled: usize,
    pub errors: Vec<String>,
}

/// Cluster statistics response
#[derive(Debug, Deserialize)]
pub struct ClusterStats {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub active_jobs: u64,
    pub job_capacity: u64,
    pub avg_cpu_usage_pct: f64,
    pub avg_memory_usage_pct: f64,
}

/// Status response
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub clusters: ClusterStats,
    pub schedules: SchedulerStats,
}

/// Submit a job
pub async fn submit(client: &ApiClient, tier: String, job: JobRequest) -> Result<()> {
    #[derive(Serialize)]
    struct SubmitRequest {
        tier: String,
        #[serde(flatten)]
        job: JobRequest,
    }

    let response = client
        .client
        .post(client.url("/api/v1/jobs"))
        .json(&SubmitRequest { tier, job })
        .send()
        .await?;

    let outcome: JobOutcome = response.json().await?;
    if outcome.success {
        println!("{}", outcome.message);
        if let Some(cluster_id) = outcome.cluster_id {
            println!("  Cluster: {}", cluster_id);
        }
    } else {
        eprintln!("Failed to schedule job: {}", outcome.message);
    }

    Ok(())
}

/// Register a workflow's cron triggers
pub async fn schedule(
    client: &ApiClient,
    repository_id: String,
    workflow_path: String,
    workflow_definition: String,
) -> Result<()> {
    #[derive(Serialize)]
    struct ScheduleRequest {
        repository_id: String,
        workflow_path: String,
        workflow_definition: String,
    }

    let response = client
        .client
        .post(client.url("/api/v1/schedules"))
        .json(&ScheduleRequest {
            repository_id,
            workflow_path: workflow_path.clone(),
            workflow_definition,
        })
        .send()
        .await?;

    if response.status().is_success() {
        let report: ScheduleReport = response.json().await?;
        println!(
            "Scheduled {} trigger(s) for '{}'",
            report.scheduled, workflow_path
        );
        for error in report.errors {
            eprintln!("  {}", error);
        }
    } else {
        let error = response.text().await?;
        eprintln!("Failed to schedule workflow: {}", error);
    }

    Ok(())
}

/// Remove cron triggers
pub async fn unschedule(
    client: &ApiClient,
    repository_id: String,
    workflow_path: String,
    cron: Option<String>,
) -> Result<()> {
    #[derive(Deserialize)]
    struct UnscheduleResponse {
        removed: usize,
    }

    let mut query = vec![
        ("repository_id", repository_id),
        ("workflow_path", workflow_path.clone()),
    ];
    if let Some(cron) = cron {
        query.push(("cron", cron));
    }

    let response = client
        .client
        .delete(client.url("/api/v1/schedules"))
        .query(&query)
        .send()
        .await?;

    if response.status().is_success() {
        let body: UnscheduleResponse = response.json().await?;
        println!("Removed {} trigger(s) for '{}'", body.removed, workflow_path);
    } else {
        let error = response.text().await?;
        eprintln!("Failed to unschedule workflow: {}", error);
    }

    Ok(())
}

/// List scheduled workflows
pub async fn schedules(client: &ApiClient, repository_id: Option<String>) -> Result<()> {
    let mut request = client.client.get(client.url("/api/v1/schedules"));
    if let Some(repository_id) = repository_id {
        request = request.query(&[("repository_id", repository_id)]);
    }
    let response = request.send().await?;

    if response.status().is_success() {
        let workflows: Vec<ScheduledWorkflow> = response.json().await?;

        if workflows.is_empty() {
            println!("No scheduled workflows");
        } else {
            println!(
                "{:<20} {:<25} {:<15} {:<8} {:<25}",
                "REPOSITORY", "WORKFLOW", "CRON", "ENABLED", "NEXT RUN"
            );
            println!("{}", "-".repeat(95));
            for wf in workflows {
                println!(
                    "{:<20} {:<25} {:<15} {:<8} {:<25}",
                    wf.repository_id,
                    wf.workflow_path,
                    wf.cron_expression,
                    if wf.enabled { "yes" } else { "no" },
                    format_time(wf.next_run)
                );
            }
        }
    } else {
        let error = response.text().await?;
        eprintln!("Failed to list schedules: {}", error);
    }

    Ok(())
}

/// Enable or disable a trigger
pub async fn toggle(
    client: &ApiClient,
    repository_id: String,
    workflow_path: String,
    cron_expression: String,
    enabled: bool,
) -> Result<()> {
    #[derive(Serialize)]
    struct ToggleRequest {
        repository_id: String,
        workflow_path: String,
        cron_expression: String,
        enabled: bool,
    }

    let response = client
        .client
        .post(client.url("/api/v1/schedules/toggle"))
        .json(&ToggleRequest {
            repository_id,
            workflow_path,
            cron_expression: cron_expression.clone(),
            enabled,
        })
        .send()
        .await?;

    if response.status().is_success() {
        println!(
            "Trigger '{}' {}",
            cron_expression,
            if enabled { "enabled" } else { "disabled" }
        );
    } else {
        let error = response.text().await?;
        eprintln!("Failed to toggle schedule: {}", error);
    }

    Ok(())
}

/// Describe a cron expression
pub async fn describe(client: &ApiClient, expression: String) -> Result<()> {
    #[derive(Deserialize)]
    struct DescribeResponse {
        description: String,
    }

    let response = client
        .client
        .get(client.url("/api/v1/cron/describe"))
        .query(&[("expression", expression)])
        .send()
        .await?;

    if response.status().is_success() {
        let body: DescribeResponse = response.json().await?;
        println!("{}", body.description);
    } else {
        let error = response.text().await?;
        eprintln!("Failed to describe expression: {}", error);
    }

    Ok(())
}

/// List cluster nodes
pub async fn clusters(client: &ApiClient) -> Result<()> {
    let response = client
        .client
        .get(client.url("/api/v1/clusters"))
        .send()
        .await?;

    if response.status().is_success() {
        let nodes: Vec<ClusterNode> = response.json().await?;

        if nodes.is_empty() {
            println!("No clusters registered");
        } else {
            println!(
                "{:<12} {:<20} {:<8} {:<6} {:<6} {:<8} {:<30}",
                "ID", "NAME", "STATUS", "CPU%", "MEM%", "JOBS", "CAPABILITIES"
            );
            println!("{}", "-".repeat(95));
            for node in nodes {
                let capabilities: Vec<&str> =
                    node.capabilities.iter().map(String::as_str).collect();
                println!(
                    "{:<12} {:<20} {:<8} {:<6.0} {:<6.0} {}/{:<6} {:<30}",
                    node.id,
                    node.name,
                    node.status.to_string(),
                    node.cpu_usage_pct,
                    node.memory_usage_pct,
                    node.active_jobs,
                    node.max_jobs,
                    capabilities.join(",")
                );
            }
        }
    } else {
        let error = response.text().await?;
        eprintln!("Failed to list clusters: {}", error);
    }

    Ok(())
}

/// Show cluster statistics
pub async fn stats(client: &ApiClient) -> Result<()> {
    let response = client
        .client
        .get(client.url("/api/v1/clusters/stats"))
        .send()
        .await?;

    if response.status().is_success() {
        let stats: ClusterStats = response.json().await?;
        print_cluster_stats(&stats);
    } else {
        let error = response.text().await?;
        eprintln!("Failed to get cluster stats: {}", error);
    }

    Ok(())
}

/// Show the limits of a tier
pub async fn limits(client: &ApiClient, tier: String) -> Result<()> {
    let response = client
        .client
        .get(client.url(&format!("/api/v1/limits/{}", tier)))
        .send()
        .await?;

    if response.status().is_success() {
        let limits: UserLimits = response.json().await?;
        println!("Tier: {}", limits.tier);
        println!("  CPU cores: {}", limits.max_cores);
        println!("  Memory: {}GB", limits.max_memory_gb);
        println!(
            "  GPU: {}",
            if limits.has_gpu_access { "yes" } else { "no" }
        );
    } else {
        let error = response.text().await?;
        eprintln!("Failed to get limits: {}", error);
    }

    Ok(())
}

/// Show system status
pub async fn status(client: &ApiClient) -> Result<()> {
    let response = client
        .client
        .get(client.url("/api/v1/status"))
        .send()
        .await?;

    if response.status().is_success() {
        let status: StatusResponse = response.json().await?;

        println!("fleet v{}", status.version);
        println!();
        print_cluster_stats(&status.clusters);
        println!(
            "Schedules: {} total, {} enabled, {} disabled",
            status.schedules.total, status.schedules.enabled, status.schedules.disabled
        );
    } else {
        let error = response.text().await?;
        eprintln!("Failed to get status: {}", error);
    }

    Ok(())
}

/// Helper to print cluster statistics
fn print_cluster_stats(stats: &ClusterStats) {
    println!(
        "Clusters: {} total, {} online, {} offline",
        stats.total, stats.online, stats.offline
    );
    println!("  Jobs: {}/{}", stats.active_jobs, stats.job_capacity);
    println!(
        "  Avg usage: CPU {:.1}%, memory {:.1}%",
        stats.avg_cpu_usage_pct, stats.avg_memory_usage_pct
    );
}

fn format_time(time: Option<chrono::DateTime<chrono::Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}
