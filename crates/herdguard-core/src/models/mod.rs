pub mod pod;
pub mod verdict;
pub mod workload;

pub use pod::{ContainerState, LifecyclePhase, PodPhase, PodSnapshot};
pub use verdict::{Decision, Verdict};
pub use workload::WorkloadRef;
