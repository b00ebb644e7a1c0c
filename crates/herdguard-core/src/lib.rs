//! herdguard Core Library
//!
//! This crate provides the configuration, error types, domain models and capability
//! traits shared by every herdguard component. It has no knowledge of a concrete
//! cluster client; infrastructure lives in `herdguard-infra`.

pub mod capacity;
pub mod cluster;
pub mod config;
pub mod counter;
pub mod error;
pub mod models;
pub mod node_state;
pub mod permit;

// Re-export commonly used types
pub use capacity::{parallel_starting_per_core, CapacityCalculator};
pub use cluster::ClusterState;
pub use config::{
    CounterFailurePolicy, GateArgs, GateConfig, LogFormat, NodeStateMode, Parallelism,
    ServiceConfig,
};
pub use counter::{counter_from_annotations, parse_counter, RetryCounterStore, COUNTER_ANNOTATION};
pub use error::{ErrorMetadata, GateError, LogLevel};
pub use models::{
    ContainerState, Decision, LifecyclePhase, PodPhase, PodSnapshot, Verdict, WorkloadRef,
};
pub use node_state::NodeStateTracker;
pub use permit::{PermitPlugin, PLUGIN_NAME};
