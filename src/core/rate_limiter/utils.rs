//! Registry maintenance for the rate limiter

use super::limiter::RateLimiter;
use super::types::AdmissionKey;
use crate::config::models::rate_limit::RateLimitConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Longest pause between two sweeps
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

impl RateLimiter {
    /// Evict every entry idle for longer than the cleanup window.
    /// Returns how many entries were removed.
    pub fn cleanup(&self) -> usize {
        let Ok(window) = chrono::Duration::from_std(self.config.cleanup_window()) else {
            return 0;
        };
        let Some(cutoff) = self.clock.now().checked_sub_signed(window) else {
            return 0;
        };

        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.last_seen >= cutoff);
        let evicted = before.saturating_sub(self.entries.len());

        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "rate limiter sweep");
        }
        evicted
    }

    /// Start background cleanup task
    pub fn start_cleanup_task(self: Arc<Self>) -> JoinHandle<()> {
        let period = self
            .config
            .cleanup_window()
            .min(MAX_SWEEP_PERIOD)
            .max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                self.cleanup();
            }
        })
    }

    /// Drop the bucket for `key` so the next request starts fresh
    pub fn forget(&self, key: &AdmissionKey) {
        self.entries.remove(key);
    }

    pub fn contains(&self, key: &AdmissionKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of live buckets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}
