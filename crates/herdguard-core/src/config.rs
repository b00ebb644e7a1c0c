//! Configuration module
//!
//! `GateArgs` is the argument document handed to the gate (JSON, camelCase keys) and is
//! resolved once into an immutable [`GateConfig`]. `ServiceConfig` carries the
//! process-level settings of the herdguard binary and is read from `HERDGUARD_*`
//! environment variables.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::error::GateError;

// Argument defaults
pub const DEFAULT_PARALLEL_STARTING_PODS_PER_NODE: u32 = 3;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_OVERLAY_GRACE_SECONDS: u64 = 5;

// Service defaults
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

/// What to do when the retry counter cannot be incremented.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterFailurePolicy {
    /// Admit the workload and skip the backoff.
    #[default]
    Open,
    /// Report an error verdict so the framework retries placement later.
    Closed,
}

/// Source of the per-node parallelism ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parallelism {
    PerNode(u32),
    PerCore(f64),
}

impl Display for Parallelism {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Parallelism::PerNode(n) => write!(f, "{} per node", n),
            Parallelism::PerCore(r) => write!(f, "{} per core", r),
        }
    }
}

/// Raw gate arguments as supplied by the operator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateArgs {
    pub parallel_starting_pods_per_node: Option<u32>,
    pub parallel_starting_pods_per_core: Option<f64>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    pub counter_failure_policy: Option<CounterFailurePolicy>,
    pub overlay_grace_seconds: Option<u64>,
}

impl GateArgs {
    /// Parse and validate an argument document. Blank input yields the defaults.
    pub fn from_json(raw: &[u8]) -> Result<Self, GateError> {
        let args = if raw.iter().all(u8::is_ascii_whitespace) {
            GateArgs::default()
        } else {
            serde_json::from_slice::<GateArgs>(raw)?
        };
        args.validate()?;
        Ok(args)
    }

    pub fn validate(&self) -> Result<(), GateError> {
        if self.parallel_starting_pods_per_node.is_some()
            && self.parallel_starting_pods_per_core.is_some()
        {
            return Err(GateError::Config(
                "cannot specify parallelStartingPodsPerNode and parallelStartingPodsPerCore at the same time"
                    .to_string(),
            ));
        }

        if self.parallel_starting_pods_per_node == Some(0) {
            return Err(GateError::Config(
                "parallelStartingPodsPerNode must be at least 1".to_string(),
            ));
        }

        if self.timeout_seconds == Some(0) {
            return Err(GateError::Config(
                "timeoutSeconds must be at least 1".to_string(),
            ));
        }

        if let Some(rate) = self.parallel_starting_pods_per_core {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(GateError::Config(format!(
                    "parallelStartingPodsPerCore must be a positive number, got {}",
                    rate
                )));
            }
        }

        Ok(())
    }

    /// Validate and fill in defaults.
    pub fn resolve(&self) -> Result<GateConfig, GateError> {
        self.validate()?;

        let parallelism = match (
            self.parallel_starting_pods_per_node,
            self.parallel_starting_pods_per_core,
        ) {
            (Some(n), _) => Parallelism::PerNode(n),
            (None, Some(r)) => Parallelism::PerCore(r),
            (None, None) => Parallelism::PerNode(DEFAULT_PARALLEL_STARTING_PODS_PER_NODE),
        };

        Ok(GateConfig {
            parallelism,
            timeout_seconds: self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            counter_failure_policy: self.counter_failure_policy.unwrap_or_default(),
            overlay_grace: Duration::from_secs(
                self.overlay_grace_seconds
                    .unwrap_or(DEFAULT_OVERLAY_GRACE_SECONDS),
            ),
        })
    }
}

/// Resolved, immutable gate configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    pub parallelism: Parallelism,
    /// Backoff base; the wait is `timeout_seconds² × retry counter`.
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub counter_failure_policy: CounterFailurePolicy,
    /// How long an optimistic admission counts as not-ready.
    pub overlay_grace: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            parallelism: Parallelism::PerNode(DEFAULT_PARALLEL_STARTING_PODS_PER_NODE),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_retries: DEFAULT_MAX_RETRIES,
            counter_failure_policy: CounterFailurePolicy::Open,
            overlay_grace: Duration::from_secs(DEFAULT_OVERLAY_GRACE_SECONDS),
        }
    }
}

impl GateConfig {
    pub fn log_summary(&self) {
        tracing::info!(
            parallelism = %self.parallelism,
            timeout_seconds = self.timeout_seconds,
            max_retries = self.max_retries,
            counter_failure_policy = ?self.counter_failure_policy,
            overlay_grace_secs = self.overlay_grace.as_secs(),
            "Gate configuration"
        );
    }
}

/// Which tracker answers not-ready queries for the gate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStateMode {
    /// List pods from the API server on every decision and add the optimistic overlay.
    #[default]
    Authoritative,
    /// Use the watch-fed in-memory classification.
    Estimated,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Process configuration for the herdguard service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path to a JSON `GateArgs` document. Defaults apply when unset.
    pub args_file: Option<String>,
    #[serde(default)]
    pub node_state: NodeStateMode,
    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_api_timeout_secs() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

fn default_environment() -> String {
    "development".to_string()
}

impl ServiceConfig {
    pub const ENV_PREFIX: &'static str = "HERDGUARD_";

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, anyhow::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::prefixed(Self::ENV_PREFIX)
            .from_iter::<_, ServiceConfig>(vars)
            .map_err(|e| anyhow::anyhow!("Invalid {}* environment: {}", Self::ENV_PREFIX, e))?;

        if config.api_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "HERDGUARD_API_TIMEOUT_SECS must be greater than zero"
            ));
        }

        Ok(config)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Load the gate arguments from `args_file`, or the defaults when no file is configured.
    pub fn load_gate_args(&self) -> Result<GateArgs, anyhow::Error> {
        match &self.args_file {
            Some(path) => {
                let raw = std::fs::read(Path::new(path))
                    .with_context(|| format!("Failed to read gate arguments from {}", path))?;
                GateArgs::from_json(&raw)
                    .with_context(|| format!("Invalid gate arguments in {}", path))
            }
            None => Ok(GateArgs::default()),
        }
    }
}
