use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use prometheus::TextEncoder;

use crate::state::AppState;

/// Prometheus text exposition of the node state gauges.
pub async fn metrics(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    match TextEncoder.encode_to_string(&state.registry.gather()) {
        Ok(s) => (StatusCode::OK, s),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("unable to encode metrics: {e}"),
        ),
    }
}
