//! Node state trackers
//!
//! Both trackers answer the gate's not-ready query. The authoritative tracker asks the
//! API server on every call; the estimated tracker classifies pods from a watch stream.
//! Each adds an [`OptimisticOverlay`] for admissions the cluster has not reflected yet.

mod authoritative;
mod estimated;
mod overlay;

pub use authoritative::AuthoritativeNodeState;
pub use estimated::{EstimatedNodeState, PhaseCounts, PodEvent, SCHEDULING_GRACE};
pub use overlay::OptimisticOverlay;
