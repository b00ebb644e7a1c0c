//! Per-workload retry counter.
//!
//! The counter lives in a well-known annotation on the workload itself, so it survives
//! restarts of the gate and is visible with ordinary cluster tooling.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::GateError;
use crate::models::WorkloadRef;

/// Annotation holding the decimal retry counter.
pub const COUNTER_ANNOTATION: &str = "ThunderingHerdScheduling/Count";

/// Read the counter from the annotations the caller attached to `workload`.
pub fn parse_counter(workload: &WorkloadRef) -> u32 {
    counter_from_annotations(workload, &workload.annotations)
}

/// Read the counter from an annotation map belonging to `workload`.
///
/// A missing annotation reads as 0. A value that is not a non-negative integer is
/// logged and also reads as 0.
pub fn counter_from_annotations(
    workload: &WorkloadRef,
    annotations: &BTreeMap<String, String>,
) -> u32 {
    let Some(raw) = annotations.get(COUNTER_ANNOTATION) else {
        return 0;
    };

    match raw.trim().parse::<u32>() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                workload = %workload,
                value = %raw,
                error = %e,
                "Unparseable retry counter annotation, treating as 0"
            );
            0
        }
    }
}

#[async_trait]
pub trait RetryCounterStore: Send + Sync {
    /// Current counter for the workload.
    async fn current_counter(&self, workload: &WorkloadRef) -> u32;

    /// Persist `value` as the workload's counter.
    async fn set_counter(&self, workload: &WorkloadRef, value: u32) -> Result<(), GateError>;

    /// Read, add one and write back. Returns the new value.
    ///
    /// Not atomic against concurrent writers; callers serialize decisions.
    async fn increment(&self, workload: &WorkloadRef) -> Result<u32, GateError> {
        let next = self.current_counter(workload).await.saturating_add(1);
        self.set_counter(workload, next).await?;
        Ok(next)
    }
}
