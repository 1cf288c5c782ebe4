//! Test database utilities
//!
//! Provides in-memory SQLite databases for testing without external
//! dependencies. Each test gets an isolated database instance.

use greenlight::config::DatabaseConfig;
use greenlight::storage::SeaOrmStore;
use greenlight::utils::clock::{Clock, SystemClock};
use std::sync::Arc;

/// Test database wrapper providing isolated in-memory SQLite instances
#[derive(Debug, Clone)]
pub struct TestDatabase {
    inner: Arc<SeaOrmStore>,
}

impl TestDatabase {
    /// Create a new migrated in-memory database
    pub async fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock)).await
    }

    /// Same as [`TestDatabase::new`] with row timestamps taken from `clock`
    pub async fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let store = SeaOrmStore::new(&test_db_config())
            .await
            .expect("Failed to create in-memory test database")
            .with_clock(clock);

        store
            .migrate()
            .await
            .expect("Failed to run database migrations");

        Self {
            inner: Arc::new(store),
        }
    }

    /// Get reference to the underlying store
    pub fn store(&self) -> &SeaOrmStore {
        &self.inner
    }

    /// Get Arc to the underlying store
    pub fn store_arc(&self) -> Arc<SeaOrmStore> {
        Arc::clone(&self.inner)
    }
}

/// In-memory SQLite only works over a single connection
pub fn test_db_config() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        connection_timeout: 5,
        run_migrations: true,
    }
}
