use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use herdguard_core::NodeStateMode;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthCheckResponse {
    status: &'static str,
    plugin: &'static str,
    node_state: &'static str,
}

/// Liveness probe - simple check that process is running
/// Always returns 200 if process can respond
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive"
        })),
    )
}

/// 503 once shutdown has started so no new permits are routed here.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let shutting_down = state.shutdown.is_cancelled();

    let response = HealthCheckResponse {
        status: if shutting_down {
            "shutting_down"
        } else {
            "healthy"
        },
        plugin: state.gate.name(),
        node_state: match state.node_state {
            NodeStateMode::Authoritative => "authoritative",
            NodeStateMode::Estimated => "estimated",
        },
    };

    let status_code = if shutting_down {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}
