use async_trait::async_trait;

use crate::error::GateError;

/// Answers "how many pods on this node are not ready yet", including admissions the
/// API server may not reflect yet.
#[async_trait]
pub trait NodeStateTracker: Send + Sync {
    async fn not_ready_count(&self, node: &str) -> Result<u32, GateError>;

    /// Count `workload_key` as not-ready on `node` until the tracker observes it.
    /// Recording the same key twice for a node counts it once.
    async fn record_optimistic_admission(&self, workload_key: &str, node: &str);
}
