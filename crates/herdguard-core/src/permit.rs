use async_trait::async_trait;

use crate::models::{Decision, Verdict, WorkloadRef};

/// Name under which the gate registers with the scheduling framework.
pub const PLUGIN_NAME: &str = "ThunderingHerdScheduling";

/// Permit extension point: called once a node has been chosen for a workload and
/// before the binding is made.
#[async_trait]
pub trait PermitPlugin: Send + Sync {
    fn name(&self) -> &'static str;

    async fn permit(&self, workload: &WorkloadRef, node: &str) -> Verdict;

    /// Like [`permit`](Self::permit), also reporting the retry counter it wrote.
    async fn permit_with_counter(&self, workload: &WorkloadRef, node: &str) -> Decision {
        Decision::new(self.permit(workload, node).await)
    }
}
