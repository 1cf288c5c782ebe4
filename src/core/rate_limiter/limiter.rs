//! Core rate limiter implementation

use super::types::{AdmissionKey, BucketParams, RateLimitResult, RateLimiterEntry};
use crate::config::models::rate_limit::RateLimitConfig;
use crate::utils::clock::{Clock, SystemClock};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of independently parameterized token buckets.
///
/// Each key owns one bucket. Lookups, insert-on-miss and eviction go through
/// the sharded map, so a check-and-consume on one key holds only that key's
/// shard lock.
pub struct RateLimiter {
    /// Rate limit configuration
    pub(super) config: RateLimitConfig,
    /// Buckets by admission key
    pub(super) entries: Arc<DashMap<AdmissionKey, RateLimiterEntry>>,
    /// Time source for refill and idle tracking
    pub(super) clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a rate limiter reading time from `clock`
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            entries: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Parameters applied to address-keyed traffic
    pub fn default_params(&self) -> BucketParams {
        BucketParams::new(self.config.requests_per_second, self.config.burst)
    }

    /// Atomically refill, check and consume one token for `key`.
    ///
    /// A missing bucket is created full with `params`. An existing bucket whose
    /// parameters differ is reconfigured in place, keeping its drained level.
    pub fn check_and_record(&self, key: &AdmissionKey, params: BucketParams) -> RateLimitResult {
        if !self.config.enabled {
            return RateLimitResult::unlimited();
        }

        let now = self.clock.now();
        let mut entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| RateLimiterEntry::new(params, now));

        // Refresh before touching the bucket so a sweep never evicts it mid-use
        entry.last_seen = now;

        if entry.bucket.params() != params {
            entry.bucket.reconfigure(params, now);
        }

        let result = entry.bucket.try_acquire(now);
        if !result.allowed {
            debug!(key = %key, retry_after = ?result.retry_after_secs, "admission denied");
        }
        result
    }

    /// Non-blocking admission check
    pub fn admit(&self, key: &AdmissionKey, params: BucketParams) -> bool {
        self.check_and_record(key, params).allowed
    }

    /// Admission check for address-keyed traffic with the configured defaults
    pub fn admit_address(&self, addr: &str) -> bool {
        if !self.config.enabled {
            return true;
        }
        self.admit(&AdmissionKey::Address(addr.to_string()), self.default_params())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("enabled", &self.config.enabled)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            entries: self.entries.clone(),
            clock: self.clock.clone(),
        }
    }
}
