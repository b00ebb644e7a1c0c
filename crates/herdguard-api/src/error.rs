//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpGateError>`; a `GateError` renders as an
//! [`ErrorResponse`] with the status code from its metadata.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use herdguard_core::{ErrorMetadata, GateError, LogLevel};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper so `IntoResponse` can be implemented for `GateError` from herdguard-core.
#[derive(Debug)]
pub struct HttpGateError(pub GateError);

impl From<GateError> for HttpGateError {
    fn from(err: GateError) -> Self {
        HttpGateError(err)
    }
}

impl From<JsonRejection> for HttpGateError {
    fn from(rejection: JsonRejection) -> Self {
        HttpGateError(GateError::InvalidRequest(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON) on deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpGateError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpGateError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &GateError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, code = code, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, code = code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, code = code, "Request failed");
        }
    }
}

impl IntoResponse for HttpGateError {
    fn into_response(self) -> Response {
        let error = &self.0;
        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(error);

        let body = Json(ErrorResponse {
            error: error.to_string(),
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error
                .is_recoverable()
                .then(|| "Retry the request later".to_string()),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let response =
            HttpGateError(GateError::InvalidRequest("nodeName is required".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_timeout_maps_to_gateway_timeout() {
        let response = HttpGateError(GateError::Timeout {
            operation: "get node".to_string(),
            timeout_secs: 10,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
