//! herdguard Scheduler
//!
//! The admission decision engine. [`ThunderingHerdGate`] maps the node's not-ready
//! count, its parallelism ceiling and the workload's retry counter to a [`Verdict`].
//!
//! [`Verdict`]: herdguard_core::Verdict

pub mod gate;

pub use gate::{backoff, ThunderingHerdGate};
