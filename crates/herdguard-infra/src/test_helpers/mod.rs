//! In-memory collaborators for tests.
//!
//! Enabled with the `test-helpers` feature so downstream crates can drive the gate
//! without an API server.

mod fixtures;
mod in_memory;
mod mock_cluster;

pub use fixtures::{pod, workload, PodBuilder};
pub use in_memory::{InMemoryCounterStore, InMemoryNodeState};
pub use mock_cluster::MockClusterState;
