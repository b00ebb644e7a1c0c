use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{health, metrics, permit};
use crate::state::AppState;

pub fn setup_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/permit", post(permit::permit))
        .route("/metrics", get(metrics::metrics))
        .route("/health", get(health::health_check))
        .route("/live", get(health::liveness_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
