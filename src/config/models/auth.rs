//! Authentication configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token, permission cache and store-timeout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Access token lifetime in seconds
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl: u64,
    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl: u64,
    /// Activation token lifetime in seconds
    #[serde(default = "default_activation_token_ttl")]
    pub activation_token_ttl: u64,
    /// How long a resolved permission set may be served from cache, in seconds
    #[serde(default = "default_permission_cache_ttl")]
    pub permission_cache_ttl: u64,
    /// Maximum number of principals held in the permission cache
    #[serde(default = "default_permission_cache_capacity")]
    pub permission_cache_capacity: u64,
    /// Upper bound on any single store round trip made while authorizing, in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Interval between expired-token purges in seconds, 0 disables the task
    #[serde(default = "default_token_purge_interval")]
    pub token_purge_interval: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_ttl: default_access_token_ttl(),
            refresh_token_ttl: default_refresh_token_ttl(),
            activation_token_ttl: default_activation_token_ttl(),
            permission_cache_ttl: default_permission_cache_ttl(),
            permission_cache_capacity: default_permission_cache_capacity(),
            store_timeout_ms: default_store_timeout_ms(),
            token_purge_interval: default_token_purge_interval(),
        }
    }
}

impl AuthConfig {
    /// Merge auth configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.access_token_ttl != default_access_token_ttl() {
            self.access_token_ttl = other.access_token_ttl;
        }
        if other.refresh_token_ttl != default_refresh_token_ttl() {
            self.refresh_token_ttl = other.refresh_token_ttl;
        }
        if other.activation_token_ttl != default_activation_token_ttl() {
            self.activation_token_ttl = other.activation_token_ttl;
        }
        if other.permission_cache_ttl != default_permission_cache_ttl() {
            self.permission_cache_ttl = other.permission_cache_ttl;
        }
        if other.permission_cache_capacity != default_permission_cache_capacity() {
            self.permission_cache_capacity = other.permission_cache_capacity;
        }
        if other.store_timeout_ms != default_store_timeout_ms() {
            self.store_timeout_ms = other.store_timeout_ms;
        }
        if other.token_purge_interval != default_token_purge_interval() {
            self.token_purge_interval = other.token_purge_interval;
        }
        self
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_ttl as i64)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_token_ttl as i64)
    }

    pub fn activation_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.activation_token_ttl as i64)
    }

    pub fn permission_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.permission_cache_ttl)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.token_purge_interval)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Validate auth configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.access_token_ttl == 0 || self.refresh_token_ttl == 0 {
            return Err("Token TTLs must be greater than 0".to_string());
        }

        if self.access_token_ttl >= self.refresh_token_ttl {
            return Err("Access token TTL must be shorter than refresh token TTL".to_string());
        }

        if self.activation_token_ttl == 0 {
            return Err("Activation token TTL must be greater than 0".to_string());
        }

        if self.permission_cache_ttl == 0 {
            return Err("Permission cache TTL must be greater than 0".to_string());
        }

        if self.store_timeout_ms == 0 {
            return Err("Store timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
