use herdguard_core::{ContainerState, PodPhase, PodSnapshot, WorkloadRef};
use k8s_openapi::api::core::v1::Pod;

pub fn workload_ref(pod: &Pod) -> WorkloadRef {
    let meta = &pod.metadata;
    WorkloadRef {
        name: meta.name.clone().unwrap_or_default(),
        namespace: meta.namespace.clone().unwrap_or_default(),
        uid: meta.uid.clone().unwrap_or_default(),
        annotations: meta.annotations.clone().unwrap_or_default(),
    }
}

pub fn pod_snapshot(pod: &Pod) -> PodSnapshot {
    let status = pod.status.as_ref();

    let ready_condition = status
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"))
        .map(|c| c.status == "True");

    let container_statuses = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| {
            statuses
                .iter()
                .map(|c| ContainerState {
                    ready: c.ready,
                    restart_count: u32::try_from(c.restart_count).unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    PodSnapshot {
        workload: workload_ref(pod),
        node_name: pod.spec.as_ref().and_then(|s| s.node_name.clone()),
        phase: PodPhase::from_api(status.and_then(|s| s.phase.as_deref())),
        ready_condition,
        container_statuses,
    }
}
