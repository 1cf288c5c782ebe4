use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Roles::Name)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Roles::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Roles::ParentId).big_integer().null())
                    .col(
                        ColumnDef::new(Roles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Roles::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_roles_parent_id")
                            .from(Roles::Table, Roles::ParentId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Permissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Permissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Permissions::Code)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RolesPermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RolesPermissions::RoleId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RolesPermissions::PermissionId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(RolesPermissions::RoleId)
                            .col(RolesPermissions::PermissionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_roles_permissions_role_id")
                            .from(RolesPermissions::Table, RolesPermissions::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_roles_permissions_permission_id")
                            .from(RolesPermissions::Table, RolesPermissions::PermissionId)
                            .to(Permissions::Table, Permissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UsersRoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UsersRoles::UserId).big_integer().not_null())
                    .col(ColumnDef::new(UsersRoles::RoleId).big_integer().not_null())
                    .col(ColumnDef::new(UsersRoles::GrantedBy).big_integer().null())
                    .col(
                        ColumnDef::new(UsersRoles::GrantedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(UsersRoles::UserId)
                            .col(UsersRoles::RoleId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_roles_user_id")
                            .from(UsersRoles::Table, UsersRoles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_roles_role_id")
                            .from(UsersRoles::Table, UsersRoles::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ResourcePermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourcePermissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ResourcePermissions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourcePermissions::ResourceType)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourcePermissions::ResourceId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourcePermissions::Permission)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourcePermissions::GrantedBy)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ResourcePermissions::GrantedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_permissions_user_id")
                            .from(ResourcePermissions::Table, ResourcePermissions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_resource_permissions_unique")
                    .table(ResourcePermissions::Table)
                    .col(ResourcePermissions::UserId)
                    .col(ResourcePermissions::ResourceType)
                    .col(ResourcePermissions::ResourceId)
                    .col(ResourcePermissions::Permission)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_resource_permissions_resource")
                    .table(ResourcePermissions::Table)
                    .col(ResourcePermissions::ResourceType)
                    .col(ResourcePermissions::ResourceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ResourcePermissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UsersRoles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RolesPermissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Permissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Roles {
    Table,
    Id,
    Name,
    Description,
    ParentId,
    CreatedAt,
    Version,
}

#[derive(DeriveIden)]
enum Permissions {
    Table,
    Id,
    Code,
}

#[derive(DeriveIden)]
enum RolesPermissions {
    Table,
    RoleId,
    PermissionId,
}

#[derive(DeriveIden)]
enum UsersRoles {
    Table,
    UserId,
    RoleId,
    GrantedBy,
    GrantedAt,
}

#[derive(DeriveIden)]
enum ResourcePermissions {
    Table,
    Id,
    UserId,
    ResourceType,
    ResourceId,
    Permission,
    GrantedBy,
    GrantedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
