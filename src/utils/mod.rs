//! Utility modules
//!
//! - **auth**: secret generation, hashing and password verification
//! - **clock**: injectable time source
//! - **error**: error type and HTTP mapping
//! - **logging**: tracing subscriber setup

pub mod auth;
pub mod clock;
pub mod error;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};

