use crate::utils::clock::Clock;
use crate::utils::error::GatewayError;
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use std::sync::Arc;

/// SeaORM-based credential store
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    pub(super) db: DatabaseConnection,
    /// Backend type indicator
    pub(super) backend_type: DatabaseBackendType,
    /// Stamps `created_at` and `granted_at` columns
    pub(super) clock: Arc<dyn Clock>,
}

/// Database backend type indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackendType {
    PostgreSQL,
    SQLite,
}

/// Map unique and foreign key violations to domain errors; everything else
/// stays a database failure.
pub(super) fn map_write_err(err: DbErr, conflict: &str) -> GatewayError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => GatewayError::conflict(conflict),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            GatewayError::not_found("referenced record not found")
        }
        _ => GatewayError::Database(err),
    }
}
