use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use herdguard_core::{
    CapacityCalculator, ClusterState, CounterFailurePolicy, Decision, GateConfig,
    NodeStateTracker, PermitPlugin, RetryCounterStore, Verdict, WorkloadRef, PLUGIN_NAME,
};
use herdguard_infra::AnnotationCounterStore;
use tokio::sync::Mutex;

/// Wait before the `counter`-th retry: `timeout_seconds² × counter` seconds.
pub fn backoff(timeout_seconds: u64, counter: u32) -> Duration {
    let secs = timeout_seconds
        .saturating_mul(timeout_seconds)
        .saturating_mul(u64::from(counter));
    Duration::from_secs(secs)
}

/// Holds workloads back while their node has too many pods that are not ready yet.
///
/// Decisions are serialized: the read of the not-ready count and the optimistic
/// admission that follows an `Admit` happen under one lock, so concurrent callers
/// cannot all observe the same free slot.
pub struct ThunderingHerdGate {
    config: GateConfig,
    capacity: CapacityCalculator,
    node_state: Arc<dyn NodeStateTracker>,
    counter: Arc<dyn RetryCounterStore>,
    lock: Mutex<()>,
}

impl ThunderingHerdGate {
    pub fn new(
        config: GateConfig,
        capacity: CapacityCalculator,
        node_state: Arc<dyn NodeStateTracker>,
        counter: Arc<dyn RetryCounterStore>,
    ) -> Self {
        config.log_summary();
        tracing::info!(plugin = PLUGIN_NAME, "Registering admission gate");

        Self {
            config,
            capacity,
            node_state,
            counter,
            lock: Mutex::new(()),
        }
    }

    /// Wire the gate against a cluster: capacity from node CPU, counters in pod annotations.
    pub fn from_cluster(
        config: GateConfig,
        cluster: Arc<dyn ClusterState>,
        node_state: Arc<dyn NodeStateTracker>,
    ) -> Self {
        let capacity = CapacityCalculator::new(config.parallelism, cluster.clone());
        let counter = Arc::new(AnnotationCounterStore::new(cluster));
        Self::new(config, capacity, node_state, counter)
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub async fn decide(&self, workload: &WorkloadRef, node: &str) -> Verdict {
        self.evaluate(workload, node).await.verdict
    }

    /// Decide and report the retry counter written on the way, if any.
    #[tracing::instrument(skip(self, workload), fields(workload = %workload))]
    pub async fn evaluate(&self, workload: &WorkloadRef, node: &str) -> Decision {
        let _guard = self.lock.lock().await;

        let decision = self.decide_locked(workload, node).await;
        if decision.verdict.is_admit() {
            self.node_state
                .record_optimistic_admission(&workload.storage_key(), node)
                .await;
        }

        decision
    }

    async fn decide_locked(&self, workload: &WorkloadRef, node: &str) -> Decision {
        let ceiling = match self.capacity.allowed_in_parallel(node).await {
            Ok(ceiling) => ceiling,
            Err(e) => {
                tracing::error!(node = %node, error = %e, "Failed to resolve parallelism ceiling");
                return Decision::new(Verdict::Error(e.to_string()));
            }
        };

        let not_ready = match self.node_state.not_ready_count(node).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(node = %node, error = %e, "Failed to count not-ready pods");
                return Decision::new(Verdict::Error(e.to_string()));
            }
        };

        tracing::debug!(node = %node, not_ready = not_ready, ceiling = ceiling, "Node load");

        if not_ready < ceiling {
            return Decision::new(Verdict::Admit);
        }

        let counter = match self.counter.increment(workload).await {
            Ok(counter) => counter,
            Err(e) => {
                let verdict = match self.config.counter_failure_policy {
                    CounterFailurePolicy::Open => {
                        tracing::warn!(
                            node = %node,
                            error = %e,
                            "Failed to increment retry counter, admitting"
                        );
                        Verdict::Admit
                    }
                    CounterFailurePolicy::Closed => {
                        tracing::error!(
                            node = %node,
                            error = %e,
                            "Failed to increment retry counter"
                        );
                        Verdict::Error(e.to_string())
                    }
                };
                return Decision::new(verdict);
            }
        };

        if counter > self.config.max_retries {
            tracing::warn!(
                node = %node,
                counter = counter,
                max_retries = self.config.max_retries,
                "Retries exhausted, admitting"
            );
            return Decision::with_retry_count(Verdict::Admit, counter);
        }

        let wait = backoff(self.config.timeout_seconds, counter);
        tracing::info!(
            node = %node,
            not_ready = not_ready,
            ceiling = ceiling,
            counter = counter,
            wait_secs = wait.as_secs(),
            "Node is at its starting limit, workload has to wait"
        );
        Decision::with_retry_count(Verdict::Wait(wait), counter)
    }
}

#[async_trait]
impl PermitPlugin for ThunderingHerdGate {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    async fn permit(&self, workload: &WorkloadRef, node: &str) -> Verdict {
        self.decide(workload, node).await
    }

    async fn permit_with_counter(&self, workload: &WorkloadRef, node: &str) -> Decision {
        self.evaluate(workload, node).await
    }
}
