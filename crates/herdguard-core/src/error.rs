//! Error types module
//!
//! Every failure coming from an external collaborator (API server, counter store,
//! argument documents) is translated into a `GateError` at the component boundary,
//! so raw transport errors never reach the decision engine's caller.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like malformed requests
    Debug,
    /// Warning level - for recoverable issues like a slow API server
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "NODE_QUERY_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("node {node} can't be queried from api server: {message}")]
    NodeQuery { node: String, message: String },

    #[error("Failed to list pods on node {node}: {message}")]
    PodQuery { node: String, message: String },

    #[error("Counter store error for pod {workload}: {message}")]
    CounterStore { workload: String, message: String },

    #[error("Invalid CPU quantity: {0}")]
    InvalidQuantity(String),

    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn gate_error_static_metadata(err: &GateError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        GateError::Config(_) => (500, "CONFIGURATION_ERROR", false, LogLevel::Error),
        GateError::InvalidArguments(_) => (400, "INVALID_ARGUMENTS", false, LogLevel::Debug),
        GateError::InvalidRequest(_) => (400, "INVALID_REQUEST", false, LogLevel::Debug),
        GateError::NodeQuery { .. } => (503, "NODE_QUERY_FAILED", true, LogLevel::Error),
        GateError::PodQuery { .. } => (503, "POD_QUERY_FAILED", true, LogLevel::Error),
        GateError::CounterStore { .. } => (503, "COUNTER_STORE_FAILED", true, LogLevel::Warn),
        GateError::InvalidQuantity(_) => (500, "INVALID_QUANTITY", false, LogLevel::Error),
        GateError::Timeout { .. } => (504, "UPSTREAM_TIMEOUT", true, LogLevel::Warn),
    }
}

impl ErrorMetadata for GateError {
    fn http_status_code(&self) -> u16 {
        gate_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        gate_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        gate_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        gate_error_static_metadata(self).3
    }
}
