//! Per-node parallelism ceiling.

use std::sync::Arc;

use crate::cluster::ClusterState;
use crate::config::Parallelism;
use crate::error::GateError;

/// `max(1, floor(cores * per_core))`. Every node can always admit at least one workload.
pub fn parallel_starting_per_core(per_core: f64, cores: f64) -> u32 {
    let allowed = (cores * per_core).floor();
    if !allowed.is_finite() || allowed < 1.0 {
        return 1;
    }
    if allowed >= u32::MAX as f64 {
        return u32::MAX;
    }
    allowed as u32
}

pub struct CapacityCalculator {
    parallelism: Parallelism,
    cluster: Arc<dyn ClusterState>,
}

impl CapacityCalculator {
    pub fn new(parallelism: Parallelism, cluster: Arc<dyn ClusterState>) -> Self {
        Self {
            parallelism,
            cluster,
        }
    }

    /// How many workloads may be starting on `node` at once.
    ///
    /// Per-node ceilings never touch the cluster. Per-core ceilings query the node's
    /// allocatable CPU and fail if the node cannot be read.
    pub async fn allowed_in_parallel(&self, node: &str) -> Result<u32, GateError> {
        match self.parallelism {
            Parallelism::PerNode(n) => Ok(n),
            Parallelism::PerCore(per_core) => {
                let cores = self.cluster.allocatable_cpu(node).await?;
                let allowed = parallel_starting_per_core(per_core, cores);
                tracing::debug!(
                    node = %node,
                    cores = cores,
                    per_core = per_core,
                    allowed = allowed,
                    "Resolved per-core parallelism"
                );
                Ok(allowed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PodSnapshot, WorkloadRef};
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CpuOnly {
        cpu: HashMap<String, f64>,
        queries: AtomicUsize,
    }

    impl CpuOnly {
        fn new(entries: &[(&str, f64)]) -> Self {
            Self {
                cpu: entries.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
                queries: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ClusterState for CpuOnly {
        async fn list_active_pods(&self, _node: &str) -> Result<Vec<PodSnapshot>, GateError> {
            Ok(Vec::new())
        }

        async fn allocatable_cpu(&self, node: &str) -> Result<f64, GateError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.cpu.get(node).copied().ok_or_else(|| GateError::NodeQuery {
                node: node.to_string(),
                message: "not found".to_string(),
            })
        }

        async fn workload_annotations(
            &self,
            _workload: &WorkloadRef,
        ) -> Result<BTreeMap<String, String>, GateError> {
            Ok(BTreeMap::new())
        }

        async fn patch_annotations(
            &self,
            _workload: &WorkloadRef,
            _annotations: BTreeMap<String, String>,
        ) -> Result<(), GateError> {
            Ok(())
        }
    }

    #[test]
    fn test_parallel_starting_per_core() {
        assert_eq!(parallel_starting_per_core(1.0, 2.0), 2);
        assert_eq!(parallel_starting_per_core(0.5, 2.0), 1);
        assert_eq!(parallel_starting_per_core(0.4, 2.0), 1);
        assert_eq!(parallel_starting_per_core(0.4, 1.6), 1);
        assert_eq!(parallel_starting_per_core(0.3, 1.6), 1);
        assert_eq!(parallel_starting_per_core(2.5, 4.0), 10);
    }

    #[test]
    fn test_parallel_starting_per_core_degenerate_inputs() {
        assert_eq!(parallel_starting_per_core(1.0, 0.0), 1);
        assert_eq!(parallel_starting_per_core(1.0, f64::NAN), 1);
        assert_eq!(parallel_starting_per_core(1.0, f64::INFINITY), 1);
        assert_eq!(parallel_starting_per_core(1e12, 1e12), u32::MAX);
    }

    #[tokio::test]
    async fn test_per_node_does_not_query_cluster() {
        let cluster = Arc::new(CpuOnly::new(&[]));
        let calc = CapacityCalculator::new(Parallelism::PerNode(3), cluster.clone());

        assert_eq!(calc.allowed_in_parallel("missing").await.unwrap(), 3);
        assert_eq!(cluster.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_per_core_uses_allocatable_cpu() {
        let cluster = Arc::new(CpuOnly::new(&[("node-1", 2.0), ("node-2", 1.6)]));
        let calc = CapacityCalculator::new(Parallelism::PerCore(1.0), cluster.clone());
        assert_eq!(calc.allowed_in_parallel("node-1").await.unwrap(), 2);

        let calc = CapacityCalculator::new(Parallelism::PerCore(0.3), cluster);
        assert_eq!(calc.allowed_in_parallel("node-2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_per_core_unknown_node_fails() {
        let cluster = Arc::new(CpuOnly::new(&[]));
        let calc = CapacityCalculator::new(Parallelism::PerCore(1.0), cluster);

        let err = calc.allowed_in_parallel("ghost").await.unwrap_err();
        assert!(matches!(err, GateError::NodeQuery { .. }));
    }
}
