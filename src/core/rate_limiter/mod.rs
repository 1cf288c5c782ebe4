//! Rate Limiting Implementation
//!
//! Per-key token buckets with continuous refill and idle eviction. Address
//! keys share the configured defaults; trusted-client keys carry their own
//! rate and burst.

mod limiter;
mod types;
mod utils;


// Re-export public types
pub use limiter::RateLimiter;
pub use types::{AdmissionKey, BucketParams, RateLimitResult, RateLimiterEntry, TokenBucket};
