//! Role, grant and assignment administration

use super::resolver::PermissionResolver;
use super::types::{
    NewResourcePermission, NewRole, ResourcePermission, ResourceRef, Role, RoleUpdate,
    UserRoleAssignment,
};
use crate::storage::CredentialStore;
use crate::utils::clock::Clock;
use crate::utils::error::{GatewayError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

const MAX_NAME_BYTES: usize = 255;

/// Mutations of the role graph and grants. Every mutation that can change a
/// resolved permission set invalidates the resolver cache.
///
/// Parent changes are serialized through `graph_lock`, which covers every
/// clone of one manager. Writers outside this process are not covered.
#[derive(Debug, Clone)]
pub struct RoleManager {
    store: Arc<dyn CredentialStore>,
    resolver: Arc<PermissionResolver>,
    clock: Arc<dyn Clock>,
    graph_lock: Arc<Mutex<()>>,
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::validation(format!("{field} must be provided")));
    }
    if value.len() > MAX_NAME_BYTES {
        return Err(GatewayError::validation(format!(
            "{field} must not be more than {MAX_NAME_BYTES} bytes long"
        )));
    }
    Ok(())
}

impl RoleManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        resolver: Arc<PermissionResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            resolver,
            clock,
            graph_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn require_role(&self, id: i64) -> Result<Role> {
        self.store
            .get_role(id)
            .await?
            .ok_or_else(|| GatewayError::not_found("role not found"))
    }

    /// Reject a parent that would put `role_id` on its own ancestor chain
    async fn check_parent(&self, role_id: i64, parent_id: i64) -> Result<()> {
        let mut visited = HashSet::new();
        let mut next = Some(self.require_role(parent_id).await?);

        while let Some(current) = next.take() {
            if current.id == role_id {
                return Err(GatewayError::configuration_violation(
                    "parent assignment would create a role cycle",
                ));
            }
            if !visited.insert(current.id) {
                return Err(GatewayError::configuration_violation(
                    "role hierarchy already contains a cycle",
                ));
            }
            if let Some(pid) = current.parent_id {
                next = self.store.get_role(pid).await?;
            }
        }
        Ok(())
    }

    // ---- roles ----

    pub async fn create_role(&self, role: NewRole) -> Result<Role> {
        validate_name("name", &role.name)?;
        if let Some(parent_id) = role.parent_id {
            self.require_role(parent_id).await?;
        }

        let role = self.store.insert_role(role).await?;
        info!(role_id = role.id, name = %role.name, parent_id = ?role.parent_id, "role created");
        Ok(role)
    }

    pub async fn get_role(&self, id: i64) -> Result<Role> {
        self.require_role(id).await
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        self.store.list_roles().await
    }

    pub async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>> {
        self.store.roles_for_user(user_id).await
    }

    /// Apply a partial update under the version check
    pub async fn update_role(&self, id: i64, update: RoleUpdate) -> Result<Role> {
        // Held from the ancestor walk until the write lands
        let _graph = self.graph_lock.lock().await;

        let mut role = self.require_role(id).await?;
        if update.version.is_some_and(|v| v != role.version) {
            return Err(GatewayError::edit_conflict());
        }

        if let Some(name) = update.name {
            validate_name("name", &name)?;
            role.name = name;
        }
        if let Some(description) = update.description {
            role.description = description;
        }
        if let Some(parent_id) = update.parent_id {
            if let Some(pid) = parent_id {
                self.check_parent(id, pid).await?;
            }
            role.parent_id = parent_id;
        }

        let role = self.store.update_role(&role).await?;
        self.resolver.invalidate_all();
        info!(role_id = role.id, version = role.version, "role updated");
        Ok(role)
    }

    /// Delete a role; its children become roots
    pub async fn delete_role(&self, id: i64) -> Result<()> {
        let _graph = self.graph_lock.lock().await;
        self.store.delete_role(id).await?;
        self.resolver.invalidate_all();
        info!(role_id = id, "role deleted");
        Ok(())
    }

    // ---- assignments ----

    pub async fn assign_role(
        &self,
        user_id: i64,
        role_id: i64,
        granted_by: Option<i64>,
    ) -> Result<UserRoleAssignment> {
        let assignment = UserRoleAssignment {
            user_id,
            role_id,
            granted_by,
            granted_at: self.clock.now(),
        };
        self.store.assign_role(&assignment).await?;
        self.resolver.invalidate(user_id).await;
        info!(user_id, role_id, granted_by = ?granted_by, "role assigned");
        Ok(assignment)
    }

    pub async fn unassign_role(&self, user_id: i64, role_id: i64) -> Result<()> {
        self.store.unassign_role(user_id, role_id).await?;
        self.resolver.invalidate(user_id).await;
        info!(user_id, role_id, "role unassigned");
        Ok(())
    }

    // ---- role permissions ----

    pub async fn grant_permission(&self, role_id: i64, code: &str) -> Result<()> {
        validate_name("permission", code)?;
        self.store.grant_role_permission(role_id, code).await?;
        self.resolver.invalidate_all();
        info!(role_id, permission = code, "permission granted to role");
        Ok(())
    }

    pub async fn revoke_permission(&self, role_id: i64, code: &str) -> Result<()> {
        self.store.revoke_role_permission(role_id, code).await?;
        self.resolver.invalidate_all();
        info!(role_id, permission = code, "permission revoked from role");
        Ok(())
    }

    /// Codes granted directly to the role
    pub async fn role_permissions(&self, role_id: i64) -> Result<Vec<String>> {
        self.require_role(role_id).await?;
        let mut codes = self.store.role_permissions(role_id).await?;
        codes.sort();
        Ok(codes)
    }

    // ---- resource permissions ----
    // Resource grants are read straight from the store, so they never touch
    // the resolver cache.

    pub async fn grant_resource_permission(
        &self,
        grant: NewResourcePermission,
    ) -> Result<ResourcePermission> {
        validate_name("permission", &grant.permission)?;
        validate_name("resource_type", &grant.resource.resource_type)?;

        let granted = self.store.grant_resource_permission(grant).await?;
        info!(
            user_id = granted.user_id,
            resource_type = %granted.resource_type,
            resource_id = granted.resource_id,
            permission = %granted.permission,
            "resource permission granted"
        );
        Ok(granted)
    }

    pub async fn revoke_resource_permission(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<()> {
        self.store
            .revoke_resource_permission(user_id, resource, code)
            .await?;
        info!(
            user_id,
            resource_type = %resource.resource_type,
            resource_id = resource.resource_id,
            permission = code,
            "resource permission revoked"
        );
        Ok(())
    }

    pub async fn resource_permissions_for_resource(
        &self,
        resource: &ResourceRef,
    ) -> Result<Vec<ResourcePermission>> {
        self.store.resource_permissions_for_resource(resource).await
    }

    pub async fn resource_permissions_for_user(
        &self,
        user_id: i64,
        resource_type: &str,
    ) -> Result<Vec<ResourcePermission>> {
        self.store
            .resource_permissions_for_user(user_id, resource_type)
            .await
    }
}
