use std::sync::Arc;

use herdguard_core::{NodeStateMode, PermitPlugin};
use prometheus::Registry;
use tokio_util::sync::CancellationToken;

/// Shared state for all handlers
pub struct AppState {
    pub gate: Arc<dyn PermitPlugin>,
    pub registry: Registry,
    pub node_state: NodeStateMode,
    pub shutdown: CancellationToken,
}
