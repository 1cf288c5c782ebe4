//! Core admission machinery
//!
//! This module contains the process-wide state that sits on the request hot path.

pub mod rate_limiter;
