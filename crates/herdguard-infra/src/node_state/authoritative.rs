use std::sync::Arc;

use async_trait::async_trait;
use herdguard_core::{ClusterState, GateError, LifecyclePhase, NodeStateTracker, PodSnapshot};

use super::estimated::PhaseCounts;
use super::overlay::OptimisticOverlay;
use crate::metrics::NodeStateMetrics;

/// Lists the node's pods from the API server on every query and adds admissions the
/// server has not reflected yet.
pub struct AuthoritativeNodeState {
    cluster: Arc<dyn ClusterState>,
    overlay: OptimisticOverlay,
    metrics: Option<NodeStateMetrics>,
}

impl AuthoritativeNodeState {
    pub fn new(cluster: Arc<dyn ClusterState>, overlay: OptimisticOverlay) -> Self {
        Self {
            cluster,
            overlay,
            metrics: None,
        }
    }

    /// Publish the node's lifecycle gauges from every listing taken for a query.
    pub fn with_metrics(mut self, metrics: NodeStateMetrics) -> Self {
        self.overlay = self.overlay.with_gauge(metrics.scheduling_pods.clone());
        self.metrics = Some(metrics);
        self
    }

    pub fn overlay(&self) -> &OptimisticOverlay {
        &self.overlay
    }
}

#[async_trait]
impl NodeStateTracker for AuthoritativeNodeState {
    async fn not_ready_count(&self, node: &str) -> Result<u32, GateError> {
        let pods = self.cluster.list_active_pods(node).await.map_err(|e| {
            tracing::error!(node = %node, error = %e, "Failed to list pods for not-ready count");
            e
        })?;

        let listed = pods
            .iter()
            .filter(|pod| !pod.phase.is_terminal() && !pod.is_ready())
            .count() as u32;
        let scheduled = self.overlay.count(node).await;

        if let Some(metrics) = &self.metrics {
            let mut counts = lifecycle_counts(&pods);
            counts.scheduling = scheduled;
            metrics.observe(node, &counts);
        }

        tracing::debug!(
            node = %node,
            listed_not_ready = listed,
            scheduled = scheduled,
            "Computed not-ready count"
        );

        Ok(listed.saturating_add(scheduled))
    }

    async fn record_optimistic_admission(&self, workload_key: &str, node: &str) {
        self.overlay.insert(node, workload_key).await;
    }
}

fn lifecycle_counts(pods: &[PodSnapshot]) -> PhaseCounts {
    let mut counts = PhaseCounts::default();
    for phase in pods.iter().filter_map(PodSnapshot::lifecycle) {
        match phase {
            LifecyclePhase::Starting => counts.starting += 1,
            LifecyclePhase::Running => counts.running += 1,
            LifecyclePhase::Unhealthy => counts.unhealthy += 1,
        }
    }
    counts
}
