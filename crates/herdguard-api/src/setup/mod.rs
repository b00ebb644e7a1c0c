//! Application setup and initialization

pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use herdguard_core::{NodeStateMode, NodeStateTracker, PermitPlugin, ServiceConfig};
use herdguard_infra::{
    init_telemetry, spawn_pod_watcher, AuthoritativeNodeState, EstimatedNodeState,
    KubeClusterState, NodeStateMetrics, OptimisticOverlay,
};
use herdguard_scheduler::ThunderingHerdGate;
use prometheus::Registry;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub struct App {
    pub state: Arc<AppState>,
    pub router: Router,
    /// Pod watcher task, present in estimated mode.
    pub watcher: Option<JoinHandle<()>>,
}

/// Initialize the entire application
pub async fn initialize_app(config: &ServiceConfig, shutdown: CancellationToken) -> Result<App> {
    init_telemetry(config.log_format, &config.environment)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    // Invalid arguments are fatal before any decision is made
    let gate_config = config
        .load_gate_args()?
        .resolve()
        .context("Gate configuration is invalid")?;

    let cluster = Arc::new(KubeClusterState::connect(config.api_timeout()).await?);
    tracing::info!(
        api_timeout_secs = config.api_timeout_secs,
        node_state = ?config.node_state,
        "Connected to Kubernetes API server"
    );

    let registry = Registry::new();
    let metrics = NodeStateMetrics::new(&registry).context("Failed to register node metrics")?;
    let mut watcher = None;

    let node_state: Arc<dyn NodeStateTracker> = match config.node_state {
        NodeStateMode::Authoritative => Arc::new(
            AuthoritativeNodeState::new(
                cluster.clone(),
                OptimisticOverlay::new(gate_config.overlay_grace),
            )
            .with_metrics(metrics),
        ),
        NodeStateMode::Estimated => {
            let estimated = Arc::new(EstimatedNodeState::new(Some(metrics)));
            watcher = Some(spawn_pod_watcher(
                cluster.client(),
                estimated.clone(),
                shutdown.clone(),
            ));
            estimated
        }
    };

    let gate: Arc<dyn PermitPlugin> = Arc::new(ThunderingHerdGate::from_cluster(
        gate_config,
        cluster,
        node_state,
    ));

    let state = Arc::new(AppState {
        gate,
        registry,
        node_state: config.node_state,
        shutdown,
    });

    let router = routes::setup_routes(state.clone());

    Ok(App {
        state,
        router,
        watcher,
    })
}
