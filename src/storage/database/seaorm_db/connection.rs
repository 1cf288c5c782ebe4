use crate::config::DatabaseConfig;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::error::{GatewayError, Result};
use sea_orm::*;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::super::migration::Migrator;
use super::types::{DatabaseBackendType, SeaOrmStore};

impl SeaOrmStore {
    /// Connect using the configured pool settings
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let db = Self::try_connect(config).await?;
        let backend_type = if config.url.starts_with("sqlite") {
            DatabaseBackendType::SQLite
        } else {
            DatabaseBackendType::PostgreSQL
        };
        info!("Database connection established ({:?})", backend_type);
        Ok(Self {
            db,
            backend_type,
            clock: Arc::new(SystemClock),
        })
    }

    /// Stamp timestamps from `clock` instead of the wall clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn try_connect(config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(config.url.clone());
        opt.max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connection_timeout))
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(3600))
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        Database::connect(opt).await.map_err(GatewayError::Database)
    }

    /// Wrap an existing connection
    pub fn from_connection(db: DatabaseConnection) -> Self {
        let backend_type = match db.get_database_backend() {
            DbBackend::Sqlite => DatabaseBackendType::SQLite,
            _ => DatabaseBackendType::PostgreSQL,
        };
        Self {
            db,
            backend_type,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn backend_type(&self) -> DatabaseBackendType {
        self.backend_type
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        Migrator::up(&self.db, None).await.map_err(|e| {
            warn!("Migration failed: {}", e);
            GatewayError::Database(e)
        })?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying database connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Ping the database
    pub async fn health_check(&self) -> Result<()> {
        self.db.ping().await.map_err(GatewayError::Database)
    }
}
