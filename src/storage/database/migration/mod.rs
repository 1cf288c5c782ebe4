use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_table;
mod m20250101_000002_create_tokens_table;
mod m20250101_000003_create_rbac_tables;
mod m20250101_000004_create_trusted_clients_tables;

/// Database migrator for SeaORM
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_table::Migration),
            Box::new(m20250101_000002_create_tokens_table::Migration),
            Box::new(m20250101_000003_create_rbac_tables::Migration),
            Box::new(m20250101_000004_create_trusted_clients_tables::Migration),
        ]
    }
}
