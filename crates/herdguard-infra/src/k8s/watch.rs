use std::sync::Arc;

use futures::StreamExt;
use herdguard_core::PodSnapshot;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::watcher::Event;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::convert::pod_snapshot;
use crate::node_state::{EstimatedNodeState, PodEvent};

/// Run the pod watcher on a background task until `cancel` fires.
pub fn spawn_pod_watcher(
    client: Client,
    state: Arc<EstimatedNodeState>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(watch_pods(client, state, cancel))
}

/// Stream pod changes from every namespace into `state`.
///
/// Watch errors are logged and retried with backoff. A relist (`Init` .. `InitDone`)
/// replaces the tracker's classification in one step.
pub async fn watch_pods(
    client: Client,
    state: Arc<EstimatedNodeState>,
    cancel: CancellationToken,
) {
    let pods: Api<Pod> = Api::all(client);
    let stream = watcher(pods, watcher::Config::default()).default_backoff();
    let mut stream = std::pin::pin!(stream);
    let mut relist: Vec<PodSnapshot> = Vec::new();

    tracing::info!("Pod watcher started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break;
            }
            next = stream.next() => match next {
                Some(Ok(event)) => handle_event(&state, event, &mut relist).await,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Pod watch failed, retrying");
                }
                None => {
                    tracing::warn!("Pod watch stream ended");
                    break;
                }
            }
        }
    }

    tracing::info!("Pod watcher stopped");
}

async fn handle_event(
    state: &EstimatedNodeState,
    event: Event<Pod>,
    relist: &mut Vec<PodSnapshot>,
) {
    match event {
        Event::Apply(pod) => state.apply(PodEvent::Applied(pod_snapshot(&pod))).await,
        Event::Delete(pod) => state.apply(PodEvent::Deleted(pod_snapshot(&pod))).await,
        Event::Init => relist.clear(),
        Event::InitApply(pod) => relist.push(pod_snapshot(&pod)),
        Event::InitDone => state.resync(std::mem::take(relist)).await,
    }
}
