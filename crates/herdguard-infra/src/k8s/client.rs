use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use herdguard_core::{ClusterState, GateError, PodSnapshot, WorkloadRef};
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{ListParams, Patch, PatchParams};
use kube::{Api, Client};
use serde_json::json;

use super::convert::pod_snapshot;
use super::quantity::parse_cpu_quantity;

/// Field selector for pods bound to `node` that have not terminated.
pub fn active_pods_selector(node: &str) -> String {
    format!(
        "spec.nodeName={},status.phase!=Succeeded,status.phase!=Failed",
        node
    )
}

/// API server access with every request bounded by `request_timeout`.
#[derive(Clone)]
pub struct KubeClusterState {
    client: Client,
    request_timeout: Duration,
}

impl KubeClusterState {
    pub fn new(client: Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    /// Build a client from the in-cluster environment or the local kubeconfig.
    pub async fn connect(request_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::try_default()
            .await
            .context("Failed to create Kubernetes client")?;
        Ok(Self::new(client, request_timeout))
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    async fn bounded<T, F>(
        &self,
        operation: &str,
        fut: F,
        map_err: impl FnOnce(kube::Error) -> GateError,
    ) -> Result<T, GateError>
    where
        F: Future<Output = Result<T, kube::Error>>,
    {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => result.map_err(map_err),
            Err(_) => {
                tracing::warn!(
                    operation = %operation,
                    timeout_secs = self.request_timeout.as_secs(),
                    "API server request timed out"
                );
                Err(GateError::Timeout {
                    operation: operation.to_string(),
                    timeout_secs: self.request_timeout.as_secs(),
                })
            }
        }
    }
}

#[async_trait]
impl ClusterState for KubeClusterState {
    async fn list_active_pods(&self, node: &str) -> Result<Vec<PodSnapshot>, GateError> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let params = ListParams::default().fields(&active_pods_selector(node));

        let list = self
            .bounded("list pods", pods.list(&params), |e| GateError::PodQuery {
                node: node.to_string(),
                message: e.to_string(),
            })
            .await?;

        Ok(list.items.iter().map(pod_snapshot).collect())
    }

    async fn allocatable_cpu(&self, node: &str) -> Result<f64, GateError> {
        let nodes: Api<Node> = Api::all(self.client.clone());

        let object = self
            .bounded("get node", nodes.get(node), |e| GateError::NodeQuery {
                node: node.to_string(),
                message: e.to_string(),
            })
            .await?;

        let cpu = object
            .status
            .and_then(|s| s.allocatable)
            .and_then(|allocatable| allocatable.get("cpu").cloned())
            .ok_or_else(|| GateError::NodeQuery {
                node: node.to_string(),
                message: "node reports no allocatable cpu".to_string(),
            })?;

        parse_cpu_quantity(&cpu.0)
    }

    async fn workload_annotations(
        &self,
        workload: &WorkloadRef,
    ) -> Result<BTreeMap<String, String>, GateError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &workload.namespace);

        let object = self
            .bounded("get pod", pods.get(&workload.name), |e| {
                GateError::CounterStore {
                    workload: workload.to_string(),
                    message: e.to_string(),
                }
            })
            .await?;

        Ok(object.metadata.annotations.unwrap_or_default())
    }

    async fn patch_annotations(
        &self,
        workload: &WorkloadRef,
        annotations: BTreeMap<String, String>,
    ) -> Result<(), GateError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &workload.namespace);
        let body = json!({ "metadata": { "annotations": annotations } });
        let params = PatchParams::default();
        let patch = Patch::Merge(&body);

        self.bounded(
            "patch pod",
            pods.patch(&workload.name, &params, &patch),
            |e| GateError::CounterStore {
                workload: workload.to_string(),
                message: e.to_string(),
            },
        )
        .await?;

        Ok(())
    }
}
