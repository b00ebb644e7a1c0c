use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use herdguard_core::{GateError, LifecyclePhase, NodeStateTracker, PodSnapshot};
use tokio::sync::RwLock;

use super::overlay::OptimisticOverlay;
use crate::metrics::NodeStateMetrics;

/// Grace for admissions not yet seen on the watch stream.
pub const SCHEDULING_GRACE: Duration = Duration::from_secs(60);

/// A change observed on the pod watch stream.
#[derive(Debug, Clone)]
pub enum PodEvent {
    Applied(PodSnapshot),
    Deleted(PodSnapshot),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseCounts {
    pub starting: u32,
    pub running: u32,
    pub unhealthy: u32,
    pub scheduling: u32,
}

impl PhaseCounts {
    pub fn not_ready(&self) -> u32 {
        self.starting
            .saturating_add(self.unhealthy)
            .saturating_add(self.scheduling)
    }
}

#[derive(Debug, Default)]
struct NodePods {
    starting: HashSet<String>,
    running: HashSet<String>,
    unhealthy: HashSet<String>,
}

impl NodePods {
    fn bucket(&mut self, phase: LifecyclePhase) -> &mut HashSet<String> {
        match phase {
            LifecyclePhase::Starting => &mut self.starting,
            LifecyclePhase::Running => &mut self.running,
            LifecyclePhase::Unhealthy => &mut self.unhealthy,
        }
    }

    fn remove(&mut self, key: &str) {
        self.starting.remove(key);
        self.running.remove(key);
        self.unhealthy.remove(key);
    }
}

/// Watch-fed estimate of every node's pods by lifecycle phase.
///
/// A pod key lives in at most one phase on one node. Not-ready is starting plus
/// unhealthy plus admissions the stream has not delivered yet.
pub struct EstimatedNodeState {
    nodes: RwLock<HashMap<String, NodePods>>,
    overlay: OptimisticOverlay,
    metrics: Option<NodeStateMetrics>,
}

impl EstimatedNodeState {
    pub fn new(metrics: Option<NodeStateMetrics>) -> Self {
        Self::with_overlay(OptimisticOverlay::new(SCHEDULING_GRACE), metrics)
    }

    pub fn with_overlay(overlay: OptimisticOverlay, metrics: Option<NodeStateMetrics>) -> Self {
        let overlay = match &metrics {
            Some(m) => overlay.with_gauge(m.scheduling_pods.clone()),
            None => overlay,
        };
        Self {
            nodes: RwLock::new(HashMap::new()),
            overlay,
            metrics,
        }
    }

    pub async fn apply(&self, event: PodEvent) {
        {
            let mut nodes = self.nodes.write().await;
            match event {
                PodEvent::Deleted(pod) => {
                    let key = pod.workload.storage_key();
                    Self::forget(&mut nodes, &key);
                    self.overlay.remove(&key).await;
                }
                PodEvent::Applied(pod) => self.classify(&mut nodes, &pod).await,
            }
        }
        self.refresh_metrics().await;
    }

    /// Replace every classification with a fresh listing, e.g. after the watch restarts.
    /// Pending optimistic admissions are kept.
    pub async fn resync(&self, pods: Vec<PodSnapshot>) {
        {
            let mut nodes = self.nodes.write().await;
            for node_pods in nodes.values_mut() {
                *node_pods = NodePods::default();
            }
            for pod in &pods {
                self.classify(&mut nodes, pod).await;
            }
        }
        tracing::info!(pods = pods.len(), "Node state resynchronized");
        self.refresh_metrics().await;
    }

    async fn classify(&self, nodes: &mut HashMap<String, NodePods>, pod: &PodSnapshot) {
        let Some(node) = pod.assigned_node() else {
            return;
        };
        let key = pod.workload.storage_key();

        Self::forget(nodes, &key);
        self.overlay.remove(&key).await;

        // Terminal pods stay forgotten.
        if let Some(phase) = pod.lifecycle() {
            nodes
                .entry(node.to_string())
                .or_default()
                .bucket(phase)
                .insert(key);
        }
    }

    fn forget(nodes: &mut HashMap<String, NodePods>, key: &str) {
        for node_pods in nodes.values_mut() {
            node_pods.remove(key);
        }
    }

    pub async fn phase_counts(&self, node: &str) -> PhaseCounts {
        let nodes = self.nodes.read().await;
        let mut counts = nodes
            .get(node)
            .map(|p| PhaseCounts {
                starting: p.starting.len() as u32,
                running: p.running.len() as u32,
                unhealthy: p.unhealthy.len() as u32,
                scheduling: 0,
            })
            .unwrap_or_default();
        counts.scheduling = self.overlay.count(node).await;
        counts
    }

    async fn refresh_metrics(&self) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        let mut node_names: HashSet<String> = self.nodes.read().await.keys().cloned().collect();
        node_names.extend(self.overlay.counts().await.into_keys());

        for node in node_names {
            let counts = self.phase_counts(&node).await;
            metrics.observe(&node, &counts);
        }
    }
}

#[async_trait]
impl NodeStateTracker for EstimatedNodeState {
    async fn not_ready_count(&self, node: &str) -> Result<u32, GateError> {
        Ok(self.phase_counts(node).await.not_ready())
    }

    async fn record_optimistic_admission(&self, workload_key: &str, node: &str) {
        {
            let mut nodes = self.nodes.write().await;
            Self::forget(&mut nodes, workload_key);
        }
        if self.overlay.contains(node, workload_key).await {
            return;
        }
        self.overlay.remove(workload_key).await;
        self.overlay.insert(node, workload_key).await;
        self.refresh_metrics().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::pod;
    use herdguard_core::{ContainerState, PodPhase};
    use prometheus::Registry;

    fn not_ready_container(restarts: u32) -> ContainerState {
        ContainerState {
            ready: false,
            restart_count: restarts,
        }
    }

    fn ready_container() -> ContainerState {
        ContainerState {
            ready: true,
            restart_count: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_starting_pod_without_container_status() {
        let state = EstimatedNodeState::new(None);
        state
            .apply(PodEvent::Applied(pod("a", "node-1").build()))
            .await;

        let counts = state.phase_counts("node-1").await;
        assert_eq!(counts.starting, 1);
        assert_eq!(state.not_ready_count("node-1").await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transitions_move_pod_between_phases() {
        let state = EstimatedNodeState::new(None);
        let starting = pod("a", "node-1").containers(vec![not_ready_container(0)]);
        let running = pod("a", "node-1").containers(vec![ready_container()]);
        let unhealthy = pod("a", "node-1").containers(vec![not_ready_container(2)]);

        state.apply(PodEvent::Applied(starting.build())).await;
        assert_eq!(
            state.phase_counts("node-1").await,
            PhaseCounts {
                starting: 1,
                ..Default::default()
            }
        );

        state.apply(PodEvent::Applied(running.build())).await;
        assert_eq!(
            state.phase_counts("node-1").await,
            PhaseCounts {
                running: 1,
                ..Default::default()
            }
        );
        assert_eq!(state.not_ready_count("node-1").await.unwrap(), 0);

        state.apply(PodEvent::Applied(unhealthy.build())).await;
        assert_eq!(
            state.phase_counts("node-1").await,
            PhaseCounts {
                unhealthy: 1,
                ..Default::default()
            }
        );
        assert_eq!(state.not_ready_count("node-1").await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_event_counts_once() {
        let state = EstimatedNodeState::new(None);
        let event = PodEvent::Applied(pod("a", "node-1").build());

        state.apply(event.clone()).await;
        state.apply(event).await;

        assert_eq!(state.phase_counts("node-1").await.starting, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_and_deleted_pods_are_removed() {
        let state = EstimatedNodeState::new(None);
        state
            .apply(PodEvent::Applied(pod("job", "node-1").build()))
            .await;
        state
            .apply(PodEvent::Applied(pod("web", "node-1").build()))
            .await;

        state
            .apply(PodEvent::Applied(
                pod("job", "node-1").phase(PodPhase::Succeeded).build(),
            ))
            .await;
        state
            .apply(PodEvent::Deleted(pod("web", "node-1").build()))
            .await;

        assert_eq!(state.phase_counts("node-1").await, PhaseCounts::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nodeless_pods_are_ignored() {
        let state = EstimatedNodeState::new(None);
        let mut unscheduled = pod("a", "node-1").build();
        unscheduled.node_name = None;

        state.apply(PodEvent::Applied(unscheduled)).await;

        assert_eq!(state.phase_counts("node-1").await, PhaseCounts::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pod_lives_on_one_node() {
        let state = EstimatedNodeState::new(None);
        state
            .apply(PodEvent::Applied(pod("a", "node-1").build()))
            .await;
        state
            .apply(PodEvent::Applied(pod("a", "node-2").build()))
            .await;

        assert_eq!(state.phase_counts("node-1").await.starting, 0);
        assert_eq!(state.phase_counts("node-2").await.starting, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_optimistic_admission_until_observed() {
        let state = EstimatedNodeState::new(None);
        let snapshot = pod("a", "node-1").build();
        let key = snapshot.workload.storage_key();

        state.record_optimistic_admission(&key, "node-1").await;
        state.record_optimistic_admission(&key, "node-1").await;
        assert_eq!(state.phase_counts("node-1").await.scheduling, 1);
        assert_eq!(state.not_ready_count("node-1").await.unwrap(), 1);

        state.apply(PodEvent::Applied(snapshot)).await;
        let counts = state.phase_counts("node-1").await;
        assert_eq!(counts.scheduling, 0);
        assert_eq!(counts.starting, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_optimistic_admission_expires_after_a_minute() {
        let state = EstimatedNodeState::new(None);
        state.record_optimistic_admission("pod-a", "node-1").await;

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(state.not_ready_count("node-1").await.unwrap(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(state.not_ready_count("node-1").await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_replaces_classification() {
        let state = EstimatedNodeState::new(None);
        state
            .apply(PodEvent::Applied(pod("gone", "node-1").build()))
            .await;
        state.record_optimistic_admission("pending", "node-1").await;

        state
            .resync(vec![
                pod("a", "node-1").build(),
                pod("b", "node-1").containers(vec![ready_container()]).build(),
            ])
            .await;

        let counts = state.phase_counts("node-1").await;
        assert_eq!(counts.starting, 1);
        assert_eq!(counts.running, 1);
        assert_eq!(counts.scheduling, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_refresh_gauges() {
        let registry = Registry::new();
        let metrics = NodeStateMetrics::new(&registry).unwrap();
        let state = EstimatedNodeState::new(Some(metrics.clone()));

        state
            .apply(PodEvent::Applied(pod("a", "node-1").build()))
            .await;
        state
            .apply(PodEvent::Applied(
                pod("b", "node-1").containers(vec![ready_container()]).build(),
            ))
            .await;

        assert_eq!(metrics.starting_pods.with_label_values(&["node-1"]).get(), 1);
        assert_eq!(metrics.running_pods.with_label_values(&["node-1"]).get(), 1);
        assert_eq!(metrics.unhealthy_pods.with_label_values(&["node-1"]).get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduling_gauge_drops_when_admission_expires() {
        let registry = Registry::new();
        let metrics = NodeStateMetrics::new(&registry).unwrap();
        let state = EstimatedNodeState::new(Some(metrics.clone()));

        state.record_optimistic_admission("pod-a", "node-1").await;
        assert_eq!(metrics.scheduling_pods.with_label_values(&["node-1"]).get(), 1);

        tokio::time::sleep(SCHEDULING_GRACE + Duration::from_secs(1)).await;
        assert_eq!(metrics.scheduling_pods.with_label_values(&["node-1"]).get(), 0);
    }
}
