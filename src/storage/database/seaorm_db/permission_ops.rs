use crate::auth::rbac::{NewResourcePermission, ResourcePermission, ResourceRef};
use crate::utils::clock::Clock;
use crate::utils::error::{GatewayError, Result};
use chrono::Utc;
use sea_orm::*;
use tracing::debug;

use super::super::entities::{self, permission, resource_permission, role_permission};
use super::types::{SeaOrmStore, map_write_err};

impl From<resource_permission::Model> for ResourcePermission {
    fn from(model: resource_permission::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            resource_type: model.resource_type,
            resource_id: model.resource_id,
            permission: model.permission,
            granted_by: model.granted_by,
            granted_at: model.granted_at.with_timezone(&Utc),
        }
    }
}

fn resource_filter(
    select: Select<entities::ResourcePermission>,
    user_id: i64,
    resource: &ResourceRef,
    code: &str,
) -> Select<entities::ResourcePermission> {
    select
        .filter(resource_permission::Column::UserId.eq(user_id))
        .filter(resource_permission::Column::ResourceType.eq(resource.resource_type.as_str()))
        .filter(resource_permission::Column::ResourceId.eq(resource.resource_id))
        .filter(resource_permission::Column::Permission.eq(code))
}

impl SeaOrmStore {
    async fn find_permission_by_code(&self, code: &str) -> Result<Option<permission::Model>> {
        entities::Permission::find()
            .filter(permission::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)
    }

    /// Permission row for `code`, created on first use
    async fn ensure_permission(&self, code: &str) -> Result<permission::Model> {
        if let Some(existing) = self.find_permission_by_code(code).await? {
            return Ok(existing);
        }

        let active_model = permission::ActiveModel {
            code: Set(code.to_string()),
            ..Default::default()
        };
        match active_model.insert(&self.db).await {
            Ok(model) => Ok(model),
            // Lost a race with a concurrent grant of the same code
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => self
                .find_permission_by_code(code)
                .await?
                .ok_or_else(|| GatewayError::storage("permission row vanished after conflict")),
            Err(e) => Err(GatewayError::Database(e)),
        }
    }

    pub(super) async fn insert_role_permission(&self, role_id: i64, code: &str) -> Result<()> {
        debug!("Granting {} to role {}", code, role_id);

        if self.find_role_by_id(role_id).await?.is_none() {
            return Err(GatewayError::not_found("role not found"));
        }
        let permission = self.ensure_permission(code).await?;

        let existing = entities::RolePermission::find_by_id((role_id, permission.id))
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        if existing.is_some() {
            return Ok(());
        }

        let active_model = role_permission::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission.id),
        };
        match entities::RolePermission::insert(active_model)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(()),
            Err(e) => Err(map_write_err(e, "permission already granted to role")),
        }
    }

    pub(super) async fn delete_role_permission(&self, role_id: i64, code: &str) -> Result<()> {
        let not_granted = || GatewayError::not_found("permission not granted to role");

        let permission = self
            .find_permission_by_code(code)
            .await?
            .ok_or_else(not_granted)?;
        let result = entities::RolePermission::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .filter(role_permission::Column::PermissionId.eq(permission.id))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        if result.rows_affected == 0 {
            return Err(not_granted());
        }
        Ok(())
    }

    pub(super) async fn role_permission_codes(&self, role_id: i64) -> Result<Vec<String>> {
        let rows = entities::RolePermission::find()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .find_also_related(entities::Permission)
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        Ok(rows
            .into_iter()
            .filter_map(|(_, permission)| permission.map(|p| p.code))
            .collect())
    }

    pub(super) async fn insert_resource_permission(
        &self,
        grant: NewResourcePermission,
    ) -> Result<ResourcePermission> {
        debug!(
            "Granting {} on {}:{} to user {}",
            grant.permission, grant.resource.resource_type, grant.resource.resource_id, grant.user_id
        );

        let active_model = resource_permission::ActiveModel {
            user_id: Set(grant.user_id),
            resource_type: Set(grant.resource.resource_type),
            resource_id: Set(grant.resource.resource_id),
            permission: Set(grant.permission),
            granted_by: Set(grant.granted_by),
            granted_at: Set(self.clock.now().into()),
            ..Default::default()
        };
        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| map_write_err(e, "resource permission already granted"))?;
        Ok(model.into())
    }

    pub(super) async fn delete_resource_permission(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<()> {
        let result = entities::ResourcePermission::delete_many()
            .filter(resource_permission::Column::UserId.eq(user_id))
            .filter(resource_permission::Column::ResourceType.eq(resource.resource_type.as_str()))
            .filter(resource_permission::Column::ResourceId.eq(resource.resource_id))
            .filter(resource_permission::Column::Permission.eq(code))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        if result.rows_affected == 0 {
            return Err(GatewayError::not_found("resource permission not found"));
        }
        Ok(())
    }

    pub(super) async fn resource_permission_exists(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<bool> {
        let count = resource_filter(entities::ResourcePermission::find(), user_id, resource, code)
            .count(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        Ok(count > 0)
    }

    pub(super) async fn resource_permission_rows_for_resource(
        &self,
        resource: &ResourceRef,
    ) -> Result<Vec<ResourcePermission>> {
        let models = entities::ResourcePermission::find()
            .filter(resource_permission::Column::ResourceType.eq(resource.resource_type.as_str()))
            .filter(resource_permission::Column::ResourceId.eq(resource.resource_id))
            .order_by_asc(resource_permission::Column::Id)
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        Ok(models.into_iter().map(ResourcePermission::from).collect())
    }

    pub(super) async fn resource_permission_rows_for_user(
        &self,
        user_id: i64,
        resource_type: &str,
    ) -> Result<Vec<ResourcePermission>> {
        let models = entities::ResourcePermission::find()
            .filter(resource_permission::Column::UserId.eq(user_id))
            .filter(resource_permission::Column::ResourceType.eq(resource_type))
            .order_by_asc(resource_permission::Column::Id)
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        Ok(models.into_iter().map(ResourcePermission::from).collect())
    }
}
