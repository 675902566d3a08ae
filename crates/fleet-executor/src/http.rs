//! HTTP executor
//!
//! Posts jobs to `{node.url}/execute`. Any 2xx response is an acceptance.
//! Non-2xx responses are expected to carry `{"error": "..."}`.

use async_trait::async_trait;
use fleet_core::{ClusterNode, FleetError, FleetResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::traits::{ExecutePayload, NodeExecutor};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Executor that talks to nodes over HTTP
pub struct HttpExecutor {
    /// HTTP client for dispatch calls
    client: reqwest::Client,
    /// Client-level timeout, if any
    timeout: Option<Duration>,
}

impl HttpExecutor {
    /// Create a new executor. Without a timeout, calls are unbounded.
    pub fn new(timeout: Option<Duration>) -> FleetResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FleetError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Get the timeout duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn execute_url(node: &ClusterNode) -> String {
        format!("{}/execute", node.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl NodeExecutor for HttpExecutor {
    async fn execute(&self, node: &ClusterNode, payload: &ExecutePayload) -> FleetResult<()> {
        let url = Self::execute_url(node);

        debug!(
            cluster_id = %node.id,
            endpoint = %url,
            workflow_id = %payload.workflow_id,
            "Sending job to cluster"
        );

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(cluster_id = %node.id, error = %e, "Cluster unreachable");
                FleetError::Dispatch(format!("Failed to communicate with cluster: {}", e))
            })?;

        let status = response.status();
        if status.is_success() {
            info!(cluster_id = %node.id, status = %status, "Cluster accepted job");
            return Ok(());
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("Cluster returned HTTP {}", status),
        };

        warn!(
            cluster_id = %node.id,
            status = %status,
            error = %message,
            "Cluster rejected job"
        );

        Err(FleetError::Dispatch(message))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PayloadLimits;
    use std::collections::BTreeMap;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> ExecutePayload {
        ExecutePayload {
            workflow_id: "wf-1".to_string(),
            yaml: "on: push".to_string(),
            user_limits: PayloadLimits {
                cores: 2,
                memory_gb: 4.0,
            },
            repository_url: "http://git.local/acme/app".to_string(),
            branch: "main".to_string(),
            env: BTreeMap::new(),
        }
    }

    #[test]
    fn test_execute_url_trims_slash() {
        let node = ClusterNode::new("c1", "one", "http://10.0.0.1:8080/");
        assert_eq!(HttpExecutor::execute_url(&node), "http://10.0.0.1:8080/execute");
    }

    #[test]
    fn test_payload_wire_names() {
        let value = serde_json::to_value(payload()).unwrap();
        assert_eq!(value["workflowId"], "wf-1");
        assert_eq!(value["userLimits"]["memoryGB"], 4.0);
        assert_eq!(value["repositoryUrl"], "http://git.local/acme/app");
    }

    #[tokio::test]
    async fn test_execute_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/execute"))
            .and(body_partial_json(serde_json::json!({
                "workflowId": "wf-1",
                "userLimits": { "cores": 2 }
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let executor = HttpExecutor::new(Some(Duration::from_secs(5))).unwrap();
        let node = ClusterNode::new("c1", "one", server.uri());

        executor.execute(&node, &payload()).await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_surfaces_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/execute"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(serde_json::json!({ "error": "node draining" })),
            )
            .mount(&server)
            .await;

        let executor = HttpExecutor::new(None).unwrap();
        let node = ClusterNode::new("c1", "one", server.uri());

        let err = executor.execute(&node, &payload()).await.unwrap_err();
        match err {
            FleetError::Dispatch(message) => assert_eq!(message, "node draining"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_non_json_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let executor = HttpExecutor::new(None).unwrap();
        let node = ClusterNode::new("c1", "one", server.uri());

        let err = executor.execute(&node, &payload()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_execute_transport_failure() {
        let executor = HttpExecutor::new(Some(Duration::from_secs(2))).unwrap();
        let node = ClusterNode::new("c1", "one", "http://127.0.0.1:1");

        let err = executor.execute(&node, &payload()).await.unwrap_err();
        match err {
            FleetError::Dispatch(message) => {
                assert!(message.starts_with("Failed to communicate with cluster"))
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
