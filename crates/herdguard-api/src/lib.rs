//! herdguard API Library
//!
//! This crate provides the HTTP handlers and application setup for the herdguard
//! service.

mod handlers;

pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpGateError};
pub use handlers::permit::{PermitRequest, PermitResponse};
pub use state::AppState;
