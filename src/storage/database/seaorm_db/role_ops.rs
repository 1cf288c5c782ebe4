use crate::auth::rbac::{NewRole, Role, UserRoleAssignment};
use crate::utils::clock::Clock;
use crate::utils::error::{GatewayError, Result};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::debug;

use super::super::entities::{self, role, role_permission, user_role};
use super::types::{SeaOrmStore, map_write_err};

const DUPLICATE_ROLE: &str = "a role with this name already exists";

impl From<role::Model> for Role {
    fn from(model: role::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            parent_id: model.parent_id,
            created_at: model.created_at.with_timezone(&Utc),
            version: model.version,
        }
    }
}

impl SeaOrmStore {
    pub(super) async fn insert_role_row(&self, new_role: NewRole) -> Result<Role> {
        debug!("Creating role: {}", new_role.name);

        if let Some(parent_id) = new_role.parent_id {
            if self.find_role_by_id(parent_id).await?.is_none() {
                return Err(GatewayError::not_found("parent role not found"));
            }
        }

        let active_model = role::ActiveModel {
            name: Set(new_role.name),
            description: Set(new_role.description),
            parent_id: Set(new_role.parent_id),
            created_at: Set(self.clock.now().into()),
            version: Set(1),
            ..Default::default()
        };
        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| map_write_err(e, DUPLICATE_ROLE))?;
        Ok(model.into())
    }

    pub(super) async fn find_role_by_id(&self, id: i64) -> Result<Option<Role>> {
        let model = entities::Role::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        Ok(model.map(Role::from))
    }

    pub(super) async fn list_role_rows(&self) -> Result<Vec<Role>> {
        let models = entities::Role::find()
            .order_by_asc(role::Column::Id)
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        Ok(models.into_iter().map(Role::from).collect())
    }

    pub(super) async fn update_role_row(&self, updated: &Role) -> Result<Role> {
        let result = entities::Role::update_many()
            .col_expr(role::Column::Name, Expr::value(updated.name.clone()))
            .col_expr(
                role::Column::Description,
                Expr::value(updated.description.clone()),
            )
            .col_expr(role::Column::ParentId, Expr::value(updated.parent_id))
            .col_expr(role::Column::Version, Expr::col(role::Column::Version).add(1))
            .filter(role::Column::Id.eq(updated.id))
            .filter(role::Column::Version.eq(updated.version))
            .exec(&self.db)
            .await
            .map_err(|e| map_write_err(e, DUPLICATE_ROLE))?;

        if result.rows_affected == 0 {
            return Err(GatewayError::edit_conflict());
        }
        self.find_role_by_id(updated.id)
            .await?
            .ok_or_else(GatewayError::edit_conflict)
    }

    pub(super) async fn delete_role_row(&self, id: i64) -> Result<()> {
        debug!("Deleting role: {}", id);

        let txn = self.db.begin().await.map_err(GatewayError::Database)?;

        // Children become roots; not every backend enforces ON DELETE SET NULL
        entities::Role::update_many()
            .col_expr(role::Column::ParentId, Expr::value(Option::<i64>::None))
            .col_expr(role::Column::Version, Expr::col(role::Column::Version).add(1))
            .filter(role::Column::ParentId.eq(id))
            .exec(&txn)
            .await
            .map_err(GatewayError::Database)?;

        entities::RolePermission::delete_many()
            .filter(role_permission::Column::RoleId.eq(id))
            .exec(&txn)
            .await
            .map_err(GatewayError::Database)?;

        entities::UserRole::delete_many()
            .filter(user_role::Column::RoleId.eq(id))
            .exec(&txn)
            .await
            .map_err(GatewayError::Database)?;

        let result = entities::Role::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(GatewayError::Database)?;
        if result.rows_affected == 0 {
            txn.rollback().await.map_err(GatewayError::Database)?;
            return Err(GatewayError::not_found("role not found"));
        }

        txn.commit().await.map_err(GatewayError::Database)
    }

    pub(super) async fn role_rows_for_user(&self, user_id: i64) -> Result<Vec<Role>> {
        let role_ids: Vec<i64> = entities::UserRole::find()
            .filter(user_role::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?
            .into_iter()
            .map(|assignment| assignment.role_id)
            .collect();

        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = entities::Role::find()
            .filter(role::Column::Id.is_in(role_ids))
            .order_by_asc(role::Column::Id)
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        Ok(models.into_iter().map(Role::from).collect())
    }

    pub(super) async fn insert_assignment(&self, assignment: &UserRoleAssignment) -> Result<()> {
        if self.find_role_by_id(assignment.role_id).await?.is_none() {
            return Err(GatewayError::not_found("role not found"));
        }
        if self.find_user_by_id(assignment.user_id).await?.is_none() {
            return Err(GatewayError::not_found("user not found"));
        }

        let active_model = user_role::ActiveModel {
            user_id: Set(assignment.user_id),
            role_id: Set(assignment.role_id),
            granted_by: Set(assignment.granted_by),
            granted_at: Set(assignment.granted_at.into()),
        };
        entities::UserRole::insert(active_model)
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| map_write_err(e, "role already assigned to user"))?;
        Ok(())
    }

    pub(super) async fn delete_assignment(&self, user_id: i64, role_id: i64) -> Result<()> {
        let result = entities::UserRole::delete_many()
            .filter(user_role::Column::UserId.eq(user_id))
            .filter(user_role::Column::RoleId.eq(role_id))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        if result.rows_affected == 0 {
            return Err(GatewayError::not_found("role assignment not found"));
        }
        Ok(())
    }
}
