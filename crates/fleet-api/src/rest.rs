//! REST API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use fleet_core::{limits_for, ClusterNode, JobOutcome, JobRequest, ScheduledWorkflow, SchedulerStats, UserLimits};
use fleet_cron::{describe_cron, CronManager, ScheduleReport};
use fleet_scheduler::{ClusterRegistry, ClusterStats, InMemoryRegistry, JobDispatcher};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub dispatcher: Arc<JobDispatcher>,
    pub registry: Arc<InMemoryRegistry>,
    pub cron: Arc<CronManager>,
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/jobs", post(submit_job))
        .route(
            "/api/v1/schedules",
            get(list_schedules)
                .post(schedule_workflow)
                .delete(unschedule_workflow),
        )
        .route("/api/v1/schedules/toggle", post(toggle_schedule))
        .route("/api/v1/schedules/stats", get(get_scheduler_stats))
        .route("/api/v1/cron/describe", get(describe))
        .route("/api/v1/clusters", get(list_clusters).post(register_cluster))
        .route("/api/v1/clusters/stats", get(get_cluster_stats))
        .route("/api/v1/limits/:tier", get(get_user_limits))
        .route("/api/v1/status", get(get_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Request to run a job
#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    /// Subscription tier of the submitter
    #[serde(default = "default_tier")]
    pub tier: String,
    #[serde(flatten)]
    pub job: JobRequest,
}

fn default_tier() -> String {
    "free".to_string()
}

/// Submit a job for placement and dispatch
async fn submit_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitJobRequest>,
) -> (StatusCode, Json<JobOutcome>) {
    info!(
        tier = %req.tier,
        cores = req.job.cores,
        memory_mb = req.job.memory_mb,
        "Submitting job"
    );

    let outcome = state.dispatcher.schedule_job(&req.job, &req.tier).await;
    let status = if outcome.success {
        StatusCode::ACCEPTED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };

    (status, Json(outcome))
}

/// Request to schedule a workflow's cron triggers
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub repository_id: String,
    pub workflow_path: String,
    pub workflow_definition: String,
}

/// Register a workflow's cron triggers
async fn schedule_workflow(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScheduleRequest>,
) -> Json<ScheduleReport> {
    info!(
        repository_id = %req.repository_id,
        workflow_path = %req.workflow_path,
        "Scheduling workflow"
    );

    let report = state
        .cron
        .schedule_workflow(&req.repository_id, &req.workflow_path, &req.workflow_definition)
        .await;

    Json(report)
}

/// Query selecting schedules to remove
#[derive(Debug, Deserialize)]
pub struct UnscheduleQuery {
    pub repository_id: String,
    pub workflow_path: String,
    /// Single expression to remove; all of the workflow's when absent
    pub cron: Option<String>,
}

/// Response for an unschedule call
#[derive(Debug, Serialize)]
pub struct UnscheduleResponse {
    pub removed: usize,
}

/// Remove one or all of a workflow's cron triggers
async fn unschedule_workflow(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UnscheduleQuery>,
) -> Json<UnscheduleResponse> {
    let removed = state
        .cron
        .unschedule_workflow(&query.repository_id, &query.workflow_path, query.cron.as_deref())
        .await;

    Json(UnscheduleResponse { removed })
}

/// Optional repository filter
#[derive(Debug, Deserialize)]
pub struct ListSchedulesQuery {
    pub repository_id: Option<String>,
}

/// List scheduled workflows
async fn list_schedules(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListSchedulesQuery>,
) -> Json<Vec<ScheduledWorkflow>> {
    Json(
        state
            .cron
            .get_scheduled_workflows(query.repository_id.as_deref())
            .await,
    )
}

/// Request to enable or disable a trigger
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub repository_id: String,
    pub workflow_path: String,
    pub cron_expression: String,
    pub enabled: bool,
}

/// Enable or disable a trigger
async fn toggle_schedule(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let found = state
        .cron
        .toggle_schedule(
            &req.repository_id,
            &req.workflow_path,
            &req.cron_expression,
            req.enabled,
        )
        .await;

    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            format!(
                "No schedule for {} {} '{}'",
                req.repository_id, req.workflow_path, req.cron_expression
            ),
        ))
    }
}

/// Schedule counts
async fn get_scheduler_stats(State(state): State<Arc<AppState>>) -> Json<SchedulerStats> {
    Json(state.cron.get_scheduler_stats().await)
}

/// Expression to describe
#[derive(Debug, Deserialize)]
pub struct DescribeQuery {
    pub expression: String,
}

/// Cron description response
#[derive(Debug, Serialize)]
pub struct DescribeResponse {
    pub expression: String,
    pub description: String,
}

/// Describe a cron expression
async fn describe(Query(query): Query<DescribeQuery>) -> Json<DescribeResponse> {
    let description = describe_cron(&query.expression);
    Json(DescribeResponse {
        expression: query.expression,
        description,
    })
}

/// Registry snapshot
async fn list_clusters(State(state): State<Arc<AppState>>) -> Json<Vec<ClusterNode>> {
    Json(state.registry.list_nodes())
}

/// Register a node or refresh its reported state
async fn register_cluster(
    State(state): State<Arc<AppState>>,
    Json(node): Json<ClusterNode>,
) -> StatusCode {
    info!(cluster_id = %node.id, status = %node.status, "Cluster report");
    state.registry.upsert(node);
    StatusCode::NO_CONTENT
}

/// Fleet-wide statistics
async fn get_cluster_stats(State(state): State<Arc<AppState>>) -> Json<ClusterStats> {
    Json(state.dispatcher.cluster_stats())
}

/// Limits for a tier
async fn get_user_limits(Path(tier): Path<String>) -> Json<UserLimits> {
    Json(limits_for(&tier))
}

/// System status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub clusters: ClusterStats,
    pub schedules: SchedulerStats,
}

/// Get system status
async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        clusters: state.dispatcher.cluster_stats(),
        schedules: state.cron.get_scheduler_stats().await,
    })
}
