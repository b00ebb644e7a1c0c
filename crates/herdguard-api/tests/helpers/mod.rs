//! Test helpers: build AppState and router against an in-memory cluster.

use std::sync::Arc;

use axum_test::TestServer;
use herdguard_api::setup::routes;
use herdguard_api::AppState;
use herdguard_core::{GateConfig, NodeStateMode};
use herdguard_infra::test_helpers::MockClusterState;
use herdguard_infra::{AuthoritativeNodeState, NodeStateMetrics, OptimisticOverlay};
use herdguard_scheduler::ThunderingHerdGate;
use prometheus::Registry;
use tokio_util::sync::CancellationToken;

/// Test application: server plus handles to its collaborators.
pub struct TestApp {
    pub server: TestServer,
    pub cluster: Arc<MockClusterState>,
    pub shutdown: CancellationToken,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(GateConfig::default())
}

pub fn setup_test_app_with(config: GateConfig) -> TestApp {
    let cluster = Arc::new(MockClusterState::new());
    let registry = Registry::new();
    let metrics = NodeStateMetrics::new(&registry).expect("Failed to register metrics");
    let node_state = Arc::new(
        AuthoritativeNodeState::new(
            cluster.clone(),
            OptimisticOverlay::new(config.overlay_grace),
        )
        .with_metrics(metrics),
    );
    let gate = Arc::new(ThunderingHerdGate::from_cluster(
        config,
        cluster.clone(),
        node_state,
    ));

    let shutdown = CancellationToken::new();

    let state = Arc::new(AppState {
        gate,
        registry,
        node_state: NodeStateMode::Authoritative,
        shutdown: shutdown.clone(),
    });

    let app = routes::setup_routes(state);
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        cluster,
        shutdown,
    }
}
