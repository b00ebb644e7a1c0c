use std::sync::Arc;

use axum::{extract::State, Json};
use herdguard_core::{Decision, GateError, Verdict, WorkloadRef};
use serde::{Deserialize, Serialize};

use crate::error::{HttpGateError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitRequest {
    pub workload: WorkloadRef,
    pub node_name: String,
}

impl PermitRequest {
    fn validate(&self) -> Result<(), GateError> {
        if self.node_name.trim().is_empty() {
            return Err(GateError::InvalidRequest(
                "nodeName must not be empty".to_string(),
            ));
        }
        if self.workload.name.is_empty() || self.workload.namespace.is_empty() {
            return Err(GateError::InvalidRequest(
                "workload name and namespace are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitResponse {
    pub verdict: String,
    pub wait_seconds: u64,
    /// Retry counter stored for the workload by this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Verdict> for PermitResponse {
    fn from(verdict: Verdict) -> Self {
        let reason = match &verdict {
            Verdict::Error(reason) => Some(reason.clone()),
            _ => None,
        };
        Self {
            verdict: verdict.code().to_string(),
            wait_seconds: verdict.wait_duration().as_secs(),
            retry_count: None,
            reason,
        }
    }
}

impl From<Decision> for PermitResponse {
    fn from(decision: Decision) -> Self {
        Self {
            retry_count: decision.retry_count,
            ..Self::from(decision.verdict)
        }
    }
}

/// Decide whether a workload may start on its chosen node.
///
/// Gate outcomes, including `error`, are returned with 200; only malformed requests fail.
pub async fn permit(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<PermitRequest>,
) -> Result<Json<PermitResponse>, HttpGateError> {
    request.validate()?;

    let decision = state
        .gate
        .permit_with_counter(&request.workload, &request.node_name)
        .await;

    tracing::info!(
        workload = %request.workload,
        node = %request.node_name,
        verdict = decision.verdict.code(),
        wait_secs = decision.verdict.wait_duration().as_secs(),
        retry_count = ?decision.retry_count,
        "Permit decided"
    );

    Ok(Json(PermitResponse::from(decision)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_response_from_verdicts() {
        let admit = PermitResponse::from(Verdict::Admit);
        assert_eq!(admit.verdict, "admit");
        assert_eq!(admit.wait_seconds, 0);
        assert_eq!(admit.reason, None);

        let wait = PermitResponse::from(Verdict::Wait(Duration::from_secs(25)));
        assert_eq!(wait.verdict, "wait");
        assert_eq!(wait.wait_seconds, 25);

        let error = PermitResponse::from(Verdict::Error("node down".to_string()));
        assert_eq!(error.verdict, "error");
        assert_eq!(error.reason.as_deref(), Some("node down"));
    }

    #[test]
    fn test_response_carries_retry_count() {
        let decision =
            Decision::with_retry_count(Verdict::Wait(Duration::from_secs(50)), 2);
        let response = PermitResponse::from(decision);
        assert_eq!(response.wait_seconds, 50);
        assert_eq!(response.retry_count, Some(2));

        let json = serde_json::to_value(PermitResponse::from(Verdict::Admit)).unwrap();
        assert!(json.get("retryCount").is_none());
    }

    #[test]
    fn test_request_validation() {
        let request = PermitRequest {
            workload: WorkloadRef::new("web-0", "shop", "u1"),
            node_name: " ".to_string(),
        };
        assert!(matches!(
            request.validate(),
            Err(GateError::InvalidRequest(_))
        ));
    }
}
