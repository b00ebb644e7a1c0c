//! Test fixtures

use herdguard_core::{ContainerState, PodPhase, PodSnapshot, WorkloadRef};

/// Workload in the `default` namespace with a uid derived from its name.
pub fn workload(name: &str) -> WorkloadRef {
    WorkloadRef::new(name, "default", format!("uid-{}", name))
}

/// Running-phase pod on `node` with no conditions and no container statuses.
pub fn pod(name: &str, node: &str) -> PodBuilder {
    PodBuilder {
        snapshot: PodSnapshot {
            workload: workload(name),
            node_name: Some(node.to_string()),
            phase: PodPhase::Running,
            ready_condition: None,
            container_statuses: Vec::new(),
        },
    }
}

#[derive(Debug, Clone)]
pub struct PodBuilder {
    snapshot: PodSnapshot,
}

impl PodBuilder {
    pub fn ready(mut self, ready: bool) -> Self {
        self.snapshot.ready_condition = Some(ready);
        self
    }

    pub fn phase(mut self, phase: PodPhase) -> Self {
        self.snapshot.phase = phase;
        self
    }

    pub fn containers(mut self, containers: Vec<ContainerState>) -> Self {
        self.snapshot.container_statuses = containers;
        self
    }

    pub fn build(self) -> PodSnapshot {
        self.snapshot
    }
}

impl From<PodBuilder> for PodSnapshot {
    fn from(builder: PodBuilder) -> Self {
        builder.build()
    }
}
