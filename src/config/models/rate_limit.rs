//! Rate limiting configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Admission controller configuration.
///
/// `requests_per_second` and `burst` apply to anonymous callers. Trusted
/// clients carry their own pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Steady-state refill rate in tokens per second
    #[serde(default = "default_rps")]
    pub requests_per_second: f64,
    /// Bucket capacity
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Idle window after which a key's bucket is evicted, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
    /// Prefer the `X-Real-IP` header over the peer address
    #[serde(default = "default_true")]
    pub trust_proxy_header: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_rps(),
            burst: default_burst(),
            cleanup_interval: default_cleanup_interval(),
            trust_proxy_header: true,
        }
    }
}

impl RateLimitConfig {
    /// Merge rate limit configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.enabled {
            self.enabled = false;
        }
        if other.requests_per_second != default_rps() {
            self.requests_per_second = other.requests_per_second;
        }
        if other.burst != default_burst() {
            self.burst = other.burst;
        }
        if other.cleanup_interval != default_cleanup_interval() {
            self.cleanup_interval = other.cleanup_interval;
        }
        if !other.trust_proxy_header {
            self.trust_proxy_header = false;
        }
        self
    }

    pub fn cleanup_window(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    /// Validate rate limit configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }

        if !(self.requests_per_second > 0.0) || !self.requests_per_second.is_finite() {
            return Err("requests_per_second must be a positive number".to_string());
        }

        if self.burst == 0 {
            return Err("burst must be greater than 0".to_string());
        }

        if (self.burst as f64) < self.requests_per_second {
            return Err("burst must be greater than or equal to requests_per_second".to_string());
        }

        if self.cleanup_interval == 0 {
            return Err("cleanup_interval must be greater than 0".to_string());
        }

        Ok(())
    }
}
