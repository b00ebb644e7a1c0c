use std::fmt::{Display, Formatter, Result as FmtResult};

use super::workload::WorkloadRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PodPhase {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    /// Map the API server's phase string. A missing phase is treated as pending.
    pub fn from_api(phase: Option<&str>) -> Self {
        match phase {
            None | Some("Pending") => PodPhase::Pending,
            Some("Running") => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            Some(_) => PodPhase::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerState {
    pub ready: bool,
    pub restart_count: u32,
}

/// Where a non-terminal pod is in its startup lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    Starting,
    Running,
    Unhealthy,
}

impl Display for LifecyclePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LifecyclePhase::Starting => write!(f, "starting"),
            LifecyclePhase::Running => write!(f, "running"),
            LifecyclePhase::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Cluster-agnostic view of a pod as reported by the API server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodSnapshot {
    pub workload: WorkloadRef,
    pub node_name: Option<String>,
    pub phase: PodPhase,
    /// Status of the `Ready` condition, `None` when the pod reports no such condition.
    pub ready_condition: Option<bool>,
    pub container_statuses: Vec<ContainerState>,
}

impl PodSnapshot {
    /// Ready only with an explicit positive readiness condition.
    pub fn is_ready(&self) -> bool {
        self.ready_condition == Some(true)
    }

    /// Node the pod is bound to, ignoring empty names.
    pub fn assigned_node(&self) -> Option<&str> {
        self.node_name.as_deref().filter(|n| !n.is_empty())
    }

    /// Classify from container statuses. `None` for terminal pods.
    pub fn lifecycle(&self) -> Option<LifecyclePhase> {
        if self.phase.is_terminal() {
            return None;
        }

        if self.container_statuses.is_empty() {
            return Some(LifecyclePhase::Starting);
        }

        let all_ready = self.container_statuses.iter().all(|c| c.ready);
        if all_ready {
            return Some(LifecyclePhase::Running);
        }

        let restarting = self
            .container_statuses
            .iter()
            .any(|c| !c.ready && c.restart_count > 0);
        if restarting {
            Some(LifecyclePhase::Unhealthy)
        } else {
            Some(LifecyclePhase::Starting)
        }
    }
}
