//! Mock cluster implementation for testing

use async_trait::async_trait;
use herdguard_core::{ClusterState, GateError, PodSnapshot, WorkloadRef};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Patch = (WorkloadRef, BTreeMap<String, String>);

/// Mock cluster that keeps pods, node CPU and received patches in memory.
///
/// Patched annotations are stored per workload and served back on later reads. A
/// workload that was never patched reads as the annotations its caller attached.
pub struct MockClusterState {
    pods: Arc<Mutex<Vec<PodSnapshot>>>,
    cpu: Arc<Mutex<HashMap<String, f64>>>,
    annotations: Arc<Mutex<HashMap<String, BTreeMap<String, String>>>>,
    patches: Arc<Mutex<Vec<Patch>>>,
    fail_pod_listing: AtomicBool,
    fail_annotation_reads: AtomicBool,
    fail_patches: AtomicBool,
}

impl MockClusterState {
    pub fn new() -> Self {
        Self {
            pods: Arc::new(Mutex::new(Vec::new())),
            cpu: Arc::new(Mutex::new(HashMap::new())),
            annotations: Arc::new(Mutex::new(HashMap::new())),
            patches: Arc::new(Mutex::new(Vec::new())),
            fail_pod_listing: AtomicBool::new(false),
            fail_annotation_reads: AtomicBool::new(false),
            fail_patches: AtomicBool::new(false),
        }
    }

    pub fn add_pod(&self, pod: impl Into<PodSnapshot>) {
        self.pods.lock().unwrap().push(pod.into());
    }

    pub fn set_allocatable_cpu(&self, node: &str, cores: f64) {
        self.cpu.lock().unwrap().insert(node.to_string(), cores);
    }

    pub fn fail_pod_listing(&self, fail: bool) {
        self.fail_pod_listing.store(fail, Ordering::SeqCst);
    }

    pub fn fail_annotation_reads(&self, fail: bool) {
        self.fail_annotation_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_patches(&self, fail: bool) {
        self.fail_patches.store(fail, Ordering::SeqCst);
    }

    /// Patches received so far (for test assertions)
    pub fn patches(&self) -> Vec<Patch> {
        self.patches.lock().unwrap().clone()
    }
}

impl Default for MockClusterState {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterState for MockClusterState {
    async fn list_active_pods(&self, node: &str) -> Result<Vec<PodSnapshot>, GateError> {
        if self.fail_pod_listing.load(Ordering::SeqCst) {
            return Err(GateError::PodQuery {
                node: node.to_string(),
                message: "connection refused".to_string(),
            });
        }

        Ok(self
            .pods
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.assigned_node() == Some(node) && !p.phase.is_terminal())
            .cloned()
            .collect())
    }

    async fn allocatable_cpu(&self, node: &str) -> Result<f64, GateError> {
        self.cpu
            .lock()
            .unwrap()
            .get(node)
            .copied()
            .ok_or_else(|| GateError::NodeQuery {
                node: node.to_string(),
                message: format!("nodes \"{}\" not found", node),
            })
    }

    async fn workload_annotations(
        &self,
        workload: &WorkloadRef,
    ) -> Result<BTreeMap<String, String>, GateError> {
        if self.fail_annotation_reads.load(Ordering::SeqCst) {
            return Err(GateError::CounterStore {
                workload: workload.to_string(),
                message: "connection refused".to_string(),
            });
        }

        Ok(self
            .annotations
            .lock()
            .unwrap()
            .get(&workload.storage_key())
            .cloned()
            .unwrap_or_else(|| workload.annotations.clone()))
    }

    async fn patch_annotations(
        &self,
        workload: &WorkloadRef,
        annotations: BTreeMap<String, String>,
    ) -> Result<(), GateError> {
        if self.fail_patches.load(Ordering::SeqCst) {
            return Err(GateError::CounterStore {
                workload: workload.to_string(),
                message: "patch rejected".to_string(),
            });
        }

        self.annotations
            .lock()
            .unwrap()
            .entry(workload.storage_key())
            .or_insert_with(|| workload.annotations.clone())
            .extend(annotations.clone());
        self.patches
            .lock()
            .unwrap()
            .push((workload.clone(), annotations));
        Ok(())
    }
}
