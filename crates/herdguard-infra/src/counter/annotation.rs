use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use herdguard_core::{
    counter_from_annotations, parse_counter, ClusterState, GateError, RetryCounterStore,
    WorkloadRef, COUNTER_ANNOTATION,
};

/// Keeps the retry counter in the workload's own `ThunderingHerdScheduling/Count`
/// annotation and writes it with a merge patch.
///
/// Reads go to the stored object so callers that resend an unchanged workload still
/// see every earlier increment. The annotations attached by the caller are only used
/// when the object cannot be read.
pub struct AnnotationCounterStore {
    cluster: Arc<dyn ClusterState>,
}

impl AnnotationCounterStore {
    pub fn new(cluster: Arc<dyn ClusterState>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl RetryCounterStore for AnnotationCounterStore {
    async fn current_counter(&self, workload: &WorkloadRef) -> u32 {
        match self.cluster.workload_annotations(workload).await {
            Ok(stored) => counter_from_annotations(workload, &stored),
            Err(e) => {
                tracing::warn!(
                    workload = %workload,
                    error = %e,
                    "Failed to read stored retry counter, using request annotations"
                );
                parse_counter(workload)
            }
        }
    }

    async fn set_counter(&self, workload: &WorkloadRef, value: u32) -> Result<(), GateError> {
        let annotations = BTreeMap::from([(COUNTER_ANNOTATION.to_string(), value.to_string())]);

        self.cluster
            .patch_annotations(workload, annotations)
            .await
            .map_err(|e| {
                tracing::warn!(workload = %workload, error = %e, "Failed to patch retry counter");
                match e {
                    GateError::CounterStore { .. } => e,
                    other => GateError::CounterStore {
                        workload: workload.to_string(),
                        message: other.to_string(),
                    },
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockClusterState;

    #[tokio::test]
    async fn test_set_counter_patches_annotation() {
        let cluster = Arc::new(MockClusterState::new());
        let store = AnnotationCounterStore::new(cluster.clone());
        let workload = WorkloadRef::new("web-0", "shop", "uid-1");

        store.set_counter(&workload, 4).await.unwrap();

        let patches = cluster.patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].0, workload);
        assert_eq!(
            patches[0].1.get(COUNTER_ANNOTATION).map(String::as_str),
            Some("4")
        );
    }

    #[tokio::test]
    async fn test_increment_from_existing_value() {
        let cluster = Arc::new(MockClusterState::new());
        let store = AnnotationCounterStore::new(cluster.clone());
        let workload =
            WorkloadRef::new("web-0", "shop", "uid-1").with_annotation(COUNTER_ANNOTATION, "5");

        assert_eq!(store.current_counter(&workload).await, 5);
        assert_eq!(store.increment(&workload).await.unwrap(), 6);
        assert_eq!(
            cluster.patches()[0].1.get(COUNTER_ANNOTATION).map(String::as_str),
            Some("6")
        );
    }

    #[tokio::test]
    async fn test_increments_accumulate_without_caller_annotations() {
        let cluster = Arc::new(MockClusterState::new());
        let store = AnnotationCounterStore::new(cluster.clone());
        let workload = WorkloadRef::new("web-0", "shop", "uid-1");

        assert_eq!(store.increment(&workload).await.unwrap(), 1);
        assert_eq!(store.increment(&workload).await.unwrap(), 2);
        assert_eq!(store.increment(&workload).await.unwrap(), 3);
        assert_eq!(store.current_counter(&workload).await, 3);
        assert!(workload.annotations.is_empty());
    }

    #[tokio::test]
    async fn test_stored_counter_wins_over_stale_caller_copy() {
        let cluster = Arc::new(MockClusterState::new());
        let store = AnnotationCounterStore::new(cluster.clone());
        let workload = WorkloadRef::new("web-0", "shop", "uid-1");
        store.set_counter(&workload, 4).await.unwrap();

        let stale = workload.with_annotation(COUNTER_ANNOTATION, "1");
        assert_eq!(store.current_counter(&stale).await, 4);
    }

    #[tokio::test]
    async fn test_read_failure_falls_back_to_caller_annotations() {
        let cluster = Arc::new(MockClusterState::new());
        cluster.fail_annotation_reads(true);
        let store = AnnotationCounterStore::new(cluster);
        let workload =
            WorkloadRef::new("web-0", "shop", "uid-1").with_annotation(COUNTER_ANNOTATION, "2");

        assert_eq!(store.current_counter(&workload).await, 2);
    }

    #[tokio::test]
    async fn test_invalid_annotation_reads_as_zero() {
        let cluster = Arc::new(MockClusterState::new());
        let store = AnnotationCounterStore::new(cluster);
        let workload = WorkloadRef::new("web-0", "shop", "uid-1")
            .with_annotation(COUNTER_ANNOTATION, "InvalidNumber");

        assert_eq!(store.current_counter(&workload).await, 0);
    }

    #[tokio::test]
    async fn test_patch_failure_maps_to_counter_store_error() {
        let cluster = Arc::new(MockClusterState::new());
        cluster.fail_patches(true);
        let store = AnnotationCounterStore::new(cluster);

        let err = store
            .increment(&WorkloadRef::new("web-0", "shop", "uid-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::CounterStore { .. }));
    }
}
