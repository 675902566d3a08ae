//! What happens when a cron trigger fires

use async_trait::async_trait;
use fleet_core::{CronConfig, DispatchConfig, FleetError, FleetResult, JobRequest, ScheduledWorkflow};
use fleet_scheduler::JobDispatcher;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Receives cron firings
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    /// Run `workflow`. Errors are logged by the caller and do not stop the timer.
    async fn on_fire(&self, workflow: ScheduledWorkflow) -> FleetResult<()>;
}

/// Submits each firing through the job dispatcher
pub struct DispatchHandler {
    dispatcher: Arc<JobDispatcher>,
    cron: CronConfig,
    dispatch: DispatchConfig,
}

impl DispatchHandler {
    /// Create a handler submitting with the resources from `cron`
    pub fn new(dispatcher: Arc<JobDispatcher>, cron: CronConfig, dispatch: DispatchConfig) -> Self {
        Self {
            dispatcher,
            cron,
            dispatch,
        }
    }

    fn job_request(&self, workflow: ScheduledWorkflow) -> JobRequest {
        let mut env = BTreeMap::new();
        env.insert("FLEET_EVENT_NAME".to_string(), "schedule".to_string());
        env.insert("FLEET_SCHEDULE".to_string(), workflow.cron_expression.clone());

        JobRequest {
            workflow_id: Some(workflow.id),
            workflow_definition: workflow.workflow_definition,
            repository_url: format!(
                "{}/{}",
                self.dispatch.repository_base_url.trim_end_matches('/'),
                workflow.repository_id
            ),
            branch: self.dispatch.default_branch.clone(),
            env,
            cores: self.cron.cores,
            memory_mb: self.cron.memory_mb,
        }
    }
}

#[async_trait]
impl TriggerHandler for DispatchHandler {
    async fn on_fire(&self, workflow: ScheduledWorkflow) -> FleetResult<()> {
        let request = self.job_request(workflow);
        let outcome = self.dispatcher.schedule_job(&request, &self.cron.tier).await;

        if outcome.success {
            info!(
                workflow_id = ?request.workflow_id,
                cluster_id = ?outcome.cluster_id,
                "Scheduled workflow dispatched"
            );
            Ok(())
        } else {
            Err(FleetError::Dispatch(outcome.message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_executor::HttpExecutor;
    use fleet_scheduler::{InMemoryRegistry, PlacementEngine};

    fn handler() -> DispatchHandler {
        let registry = Arc::new(InMemoryRegistry::default());
        let executor = Arc::new(HttpExecutor::new(None).unwrap());
        let dispatcher = Arc::new(JobDispatcher::new(PlacementEngine::new(registry), executor));
        DispatchHandler::new(dispatcher, CronConfig::default(), DispatchConfig::default())
    }

    #[test]
    fn test_job_request() {
        let workflow = ScheduledWorkflow::new("acme/app", "ci.yml", "jobs: {}", "0 0 * * *");
        let request = handler().job_request(workflow);

        assert_eq!(request.workflow_id.as_deref(), Some("acme/app:ci.yml:0 0 * * *"));
        assert_eq!(request.repository_url, "http://localhost:3000/acme/app");
        assert_eq!(request.branch, "main");
        assert_eq!(request.cores, 2);
        assert_eq!(request.env["FLEET_EVENT_NAME"], "schedule");
    }

    #[tokio::test]
    async fn test_failed_dispatch_is_error() {
        let workflow = ScheduledWorkflow::new("acme/app", "ci.yml", "jobs: {}", "0 0 * * *");
        let err = handler().on_fire(workflow).await.unwrap_err();
        assert!(err.to_string().contains("No clusters available"));
    }
}
