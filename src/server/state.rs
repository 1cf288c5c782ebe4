//! Application state shared across HTTP handlers

use crate::auth::AuthSystem;
use crate::config::Config;
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// All fields are wrapped in Arc so every worker holds the same limiter
/// buckets and permission cache.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Service configuration (shared read-only)
    pub config: Arc<Config>,
    /// Authentication system
    pub auth: Arc<AuthSystem>,
}

impl AppState {
    pub fn new(config: Config, auth: AuthSystem) -> Self {
        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
