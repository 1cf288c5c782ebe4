//! Configuration data models
//!
//! This module defines all configuration structures used throughout the service.

#![allow(missing_docs)]

pub mod auth;
pub mod rate_limit;
pub mod server;
pub mod storage;

// Re-export all configuration types
pub use auth::*;
pub use rate_limit::*;
pub use server::*;
pub use storage::*;

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    4000
}

/// Default request timeout in seconds
pub fn default_timeout() -> u64 {
    30
}

/// Default maximum body size in bytes
pub fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

pub fn default_log_level() -> String {
    "info".to_string()
}

/// Access token lifetime in seconds
pub fn default_access_token_ttl() -> u64 {
    15 * 60
}

/// Refresh token lifetime in seconds
pub fn default_refresh_token_ttl() -> u64 {
    24 * 60 * 60
}

/// Activation token lifetime in seconds
pub fn default_activation_token_ttl() -> u64 {
    3 * 24 * 60 * 60
}

pub fn default_permission_cache_ttl() -> u64 {
    5 * 60
}

pub fn default_permission_cache_capacity() -> u64 {
    10_000
}

/// Per-call bound on store round trips, in milliseconds
pub fn default_store_timeout_ms() -> u64 {
    3_000
}

pub fn default_token_purge_interval() -> u64 {
    60 * 60
}

pub fn default_rps() -> f64 {
    2.0
}

pub fn default_burst() -> u32 {
    4
}

/// Idle window after which limiter entries are evicted, in seconds
pub fn default_cleanup_interval() -> u64 {
    3 * 60
}

pub fn default_true() -> bool {
    true
}

pub fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

pub fn default_max_connections() -> u32 {
    10
}

pub fn default_connection_timeout() -> u64 {
    5
}
