//! Per-request authorization gate
//!
//! Runs authenticate, admit and permission check in order. The first step
//! that fails decides the outcome and later steps never run.

#[allow(clippy::module_inception)]
mod gate;
mod types;

pub use gate::AuthorizationGate;
pub use types::{Decision, DenyReason, RequestCredentials, parse_bearer};
