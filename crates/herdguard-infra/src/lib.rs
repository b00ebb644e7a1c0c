//! herdguard Infrastructure Library
//!
//! This crate provides the concrete collaborators behind the gate's capability traits:
//! - Telemetry initialization
//! - Node state trackers (authoritative and watch-fed estimated)
//! - Annotation-backed retry counter store
//! - Prometheus gauges for node state
//! - Kubernetes API server client and pod watcher

pub mod counter;
pub mod metrics;
pub mod node_state;
pub mod telemetry;

#[cfg(feature = "kube")]
pub mod k8s;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

// Re-export commonly used types
pub use counter::AnnotationCounterStore;
pub use metrics::NodeStateMetrics;
pub use node_state::{
    AuthoritativeNodeState, EstimatedNodeState, OptimisticOverlay, PhaseCounts, PodEvent,
};
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "kube")]
pub use k8s::{parse_cpu_quantity, spawn_pod_watcher, watch_pods, KubeClusterState};
