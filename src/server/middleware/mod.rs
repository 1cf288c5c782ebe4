//! HTTP middleware implementations
//!
//! - Admission: authenticate, verify trusted-client keys and apply the
//!   token-bucket limiter before any handler runs
//! - Helpers for credential and address extraction

mod admission;
mod helpers;


pub use admission::{AdmissionMiddleware, AdmissionMiddlewareService, request_context};
pub use helpers::{
    API_KEY_HEADER, REAL_IP_HEADER, UNKNOWN_ADDR, client_addr, extract_credentials,
    is_public_route,
};
