//! Cluster state capability.
//!
//! The gate needs the pods bound to a node, a node's allocatable CPU, and read and
//! merge access to a pod's annotations. Implementations translate transport failures
//! into [`GateError`] before returning.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::GateError;
use crate::models::{PodSnapshot, WorkloadRef};

#[async_trait]
pub trait ClusterState: Send + Sync {
    /// Pods assigned to `node` that are neither succeeded nor failed.
    async fn list_active_pods(&self, node: &str) -> Result<Vec<PodSnapshot>, GateError>;

    /// Allocatable CPU of `node`, in cores.
    async fn allocatable_cpu(&self, node: &str) -> Result<f64, GateError>;

    /// Annotations currently stored on the workload's object.
    async fn workload_annotations(
        &self,
        workload: &WorkloadRef,
    ) -> Result<BTreeMap<String, String>, GateError>;

    /// Merge `annotations` into the workload's existing annotations.
    async fn patch_annotations(
        &self,
        workload: &WorkloadRef,
        annotations: BTreeMap<String, String>,
    ) -> Result<(), GateError>;
}
