use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TrustedClients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrustedClients::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TrustedClients::Name).string_len(500).not_null())
                    .col(
                        ColumnDef::new(TrustedClients::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(TrustedClients::ApiKeyHash)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TrustedClients::RateLimitRps).double().not_null())
                    .col(
                        ColumnDef::new(TrustedClients::RateLimitBurst)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrustedClients::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TrustedClients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TrustedClients::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TrustedClientLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrustedClientLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TrustedClientLogs::ClientId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrustedClientLogs::Endpoint).text().not_null())
                    .col(
                        ColumnDef::new(TrustedClientLogs::Method)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrustedClientLogs::StatusCode)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrustedClientLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trusted_client_logs_client_id")
                            .from(TrustedClientLogs::Table, TrustedClientLogs::ClientId)
                            .to(TrustedClients::Table, TrustedClients::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_trusted_client_logs_client_id")
                    .table(TrustedClientLogs::Table)
                    .col(TrustedClientLogs::ClientId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TrustedClientLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TrustedClients::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TrustedClients {
    Table,
    Id,
    Name,
    Description,
    ApiKeyHash,
    RateLimitRps,
    RateLimitBurst,
    Enabled,
    CreatedAt,
    Version,
}

#[derive(DeriveIden)]
enum TrustedClientLogs {
    Table,
    Id,
    ClientId,
    Endpoint,
    Method,
    StatusCode,
    CreatedAt,
}
