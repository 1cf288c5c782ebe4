//! Rate limiter types and data structures

use chrono::{DateTime, Utc};
use std::fmt;

/// Rate limit result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Bucket capacity
    pub limit: u32,
    /// Whole tokens left after this request
    pub remaining: u32,
    /// Retry after (in seconds, only set when not allowed)
    pub retry_after_secs: Option<u64>,
}

impl RateLimitResult {
    pub(super) fn unlimited() -> Self {
        Self {
            allowed: true,
            limit: u32::MAX,
            remaining: u32::MAX,
            retry_after_secs: None,
        }
    }
}

/// Identifier selecting a bucket in the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdmissionKey {
    /// Anonymous or user traffic, keyed by caller address
    Address(String),
    /// Registered machine caller, keyed by its id
    TrustedClient(i64),
}

impl fmt::Display for AdmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionKey::Address(addr) => write!(f, "ip:{}", addr),
            AdmissionKey::TrustedClient(id) => write!(f, "client:{}", id),
        }
    }
}

/// Refill rate and capacity for one bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketParams {
    /// Tokens added per second
    pub rate: f64,
    /// Maximum tokens held
    pub burst: u32,
}

impl BucketParams {
    pub fn new(rate: f64, burst: u32) -> Self {
        Self { rate, burst }
    }
}

/// Continuously refilled token bucket
#[derive(Debug, Clone)]
pub struct TokenBucket {
    params: BucketParams,
    tokens: f64,
    last_refill: DateTime<Utc>,
}

impl TokenBucket {
    /// New buckets start full
    pub fn new(params: BucketParams, now: DateTime<Utc>) -> Self {
        Self {
            params,
            tokens: params.burst as f64,
            last_refill: now,
        }
    }

    pub fn params(&self) -> BucketParams {
        self.params
    }

    /// Tokens currently available, after refilling up to `now`
    pub fn available(&mut self, now: DateTime<Utc>) -> f64 {
        self.refill(now);
        self.tokens
    }

    /// Swap in new parameters without granting a fresh burst
    pub fn reconfigure(&mut self, params: BucketParams, now: DateTime<Utc>) {
        self.refill(now);
        self.params = params;
        self.tokens = self.tokens.min(params.burst as f64);
    }

    fn refill(&mut self, now: DateTime<Utc>) {
        // A clock that steps backwards adds nothing
        let elapsed = (now - self.last_refill)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let capacity = self.params.burst as f64;
        self.tokens = (self.tokens + elapsed * self.params.rate).min(capacity);
        if now > self.last_refill {
            self.last_refill = now;
        }
    }

    /// Consume one token if available
    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> RateLimitResult {
        self.refill(now);

        let allowed = self.tokens >= 1.0;
        if allowed {
            self.tokens -= 1.0;
        }

        let retry_after_secs = if allowed {
            None
        } else {
            let wait = (1.0 - self.tokens) / self.params.rate;
            Some((wait.ceil() as u64).max(1))
        };

        RateLimitResult {
            allowed,
            limit: self.params.burst,
            remaining: self.tokens.max(0.0) as u32,
            retry_after_secs,
        }
    }
}

/// Registry slot for one admission key
#[derive(Debug, Clone)]
pub struct RateLimiterEntry {
    pub(super) bucket: TokenBucket,
    pub(super) last_seen: DateTime<Utc>,
}

impl RateLimiterEntry {
    pub(super) fn new(params: BucketParams, now: DateTime<Utc>) -> Self {
        Self {
            bucket: TokenBucket::new(params, now),
            last_seen: now,
        }
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }
}
