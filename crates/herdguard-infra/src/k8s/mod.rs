//! Kubernetes adapter
//!
//! Implements [`herdguard_core::ClusterState`] on top of `kube` and feeds the estimated
//! tracker from a pod watch stream. `kube::Error` never leaves this module.

mod client;
mod convert;
mod quantity;
mod watch;

pub use client::{active_pods_selector, KubeClusterState};
pub use convert::{pod_snapshot, workload_ref};
pub use quantity::parse_cpu_quantity;
pub use watch::{spawn_pod_watcher, watch_pods};
