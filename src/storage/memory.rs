//! In-memory credential store
//!
//! All tables sit behind one `parking_lot::RwLock`; no lock is held across
//! an await point. Contents are lost on restart.

use super::CredentialStore;
use crate::auth::rbac::{
    NewResourcePermission, NewRole, ResourcePermission, ResourceRef, Role, UserRoleAssignment,
};
use crate::auth::token::{TokenRecord, TokenScope};
use crate::auth::trusted_client::{NewTrustedClient, TrustedClient, TrustedClientLog};
use crate::auth::{NewUser, User};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    tokens: Vec<TokenRecord>,
    roles: BTreeMap<i64, Role>,
    role_permissions: BTreeSet<(i64, String)>,
    user_roles: BTreeMap<(i64, i64), UserRoleAssignment>,
    resource_permissions: BTreeMap<i64, ResourcePermission>,
    trusted_clients: BTreeMap<i64, TrustedClient>,
    trusted_client_logs: Vec<TrustedClientLog>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local [`CredentialStore`]
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Stamp `created_at` fields from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
        }
    }

    /// Audit rows written so far
    pub fn trusted_client_logs(&self) -> Vec<TrustedClientLog> {
        self.tables.read().trusted_client_logs.clone()
    }

    /// Number of token rows, expired ones included
    pub fn token_count(&self) -> usize {
        self.tables.read().tokens.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(GatewayError::conflict("a user with this email address already exists"));
        }
        let id = tables.next_id();
        let stored = User {
            id,
            created_at: self.clock.now(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            activated: user.activated,
            version: 1,
        };
        tables.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn set_user_activated(
        &self,
        id: i64,
        activated: bool,
        expected_version: i32,
    ) -> Result<User> {
        let mut tables = self.tables.write();
        match tables.users.get_mut(&id) {
            Some(user) if user.version == expected_version => {
                user.activated = activated;
                user.version += 1;
                Ok(user.clone())
            }
            _ => Err(GatewayError::edit_conflict()),
        }
    }

    async fn insert_tokens(&self, tokens: &[TokenRecord]) -> Result<()> {
        let mut tables = self.tables.write();
        if tokens
            .iter()
            .any(|t| tables.tokens.iter().any(|existing| existing.hash == t.hash))
        {
            return Err(GatewayError::conflict("duplicate token hash"));
        }
        tables.tokens.extend_from_slice(tokens);
        Ok(())
    }

    async fn find_token(&self, hash: &str, scope: TokenScope) -> Result<Option<TokenRecord>> {
        Ok(self
            .tables
            .read()
            .tokens
            .iter()
            .find(|t| t.hash == hash && t.scope == scope)
            .cloned())
    }

    async fn rotate_refresh_tokens(
        &self,
        old_hash: &str,
        user_id: i64,
        replacement: &[TokenRecord],
    ) -> Result<Option<u64>> {
        let mut tables = self.tables.write();
        if !tables
            .tokens
            .iter()
            .any(|t| t.hash == old_hash && t.scope == TokenScope::Refresh)
        {
            return Ok(None);
        }

        let revoked = |t: &TokenRecord| {
            t.scope == TokenScope::Refresh && (t.hash == old_hash || t.user_id == user_id)
        };
        let mut kept: Vec<TokenRecord> =
            tables.tokens.iter().filter(|t| !revoked(*t)).cloned().collect();
        if replacement
            .iter()
            .any(|r| kept.iter().any(|existing| existing.hash == r.hash))
        {
            return Err(GatewayError::conflict("duplicate token hash"));
        }

        let count = (tables.tokens.len() - kept.len()) as u64;
        kept.extend_from_slice(replacement);
        tables.tokens = kept;
        Ok(Some(count))
    }

    async fn delete_tokens_for_user(&self, user_id: i64, scope: TokenScope) -> Result<u64> {
        let mut tables = self.tables.write();
        let before = tables.tokens.len();
        tables
            .tokens
            .retain(|t| !(t.user_id == user_id && t.scope == scope));
        Ok((before - tables.tokens.len()) as u64)
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write();
        let before = tables.tokens.len();
        tables.tokens.retain(|t| !t.is_expired_at(now));
        Ok((before - tables.tokens.len()) as u64)
    }

    async fn insert_role(&self, role: NewRole) -> Result<Role> {
        let mut tables = self.tables.write();
        if tables.roles.values().any(|r| r.name == role.name) {
            return Err(GatewayError::conflict("a role with this name already exists"));
        }
        if let Some(parent_id) = role.parent_id {
            if !tables.roles.contains_key(&parent_id) {
                return Err(GatewayError::not_found("parent role not found"));
            }
        }
        let id = tables.next_id();
        let stored = Role {
            id,
            name: role.name,
            description: role.description,
            parent_id: role.parent_id,
            created_at: self.clock.now(),
            version: 1,
        };
        tables.roles.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_role(&self, id: i64) -> Result<Option<Role>> {
        Ok(self.tables.read().roles.get(&id).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        Ok(self.tables.read().roles.values().cloned().collect())
    }

    async fn update_role(&self, role: &Role) -> Result<Role> {
        let mut tables = self.tables.write();
        if tables
            .roles
            .values()
            .any(|r| r.id != role.id && r.name == role.name)
        {
            return Err(GatewayError::conflict("a role with this name already exists"));
        }
        match tables.roles.get_mut(&role.id) {
            Some(stored) if stored.version == role.version => {
                stored.name = role.name.clone();
                stored.description = role.description.clone();
                stored.parent_id = role.parent_id;
                stored.version += 1;
                Ok(stored.clone())
            }
            _ => Err(GatewayError::edit_conflict()),
        }
    }

    async fn delete_role(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.roles.remove(&id).is_none() {
            return Err(GatewayError::not_found("role not found"));
        }
        for role in tables.roles.values_mut() {
            if role.parent_id == Some(id) {
                role.parent_id = None;
                role.version += 1;
            }
        }
        tables.role_permissions.retain(|(role_id, _)| *role_id != id);
        tables.user_roles.retain(|(_, role_id), _| *role_id != id);
        Ok(())
    }

    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>> {
        let tables = self.tables.read();
        Ok(tables
            .user_roles
            .keys()
            .filter(|(uid, _)| *uid == user_id)
            .filter_map(|(_, role_id)| tables.roles.get(role_id).cloned())
            .collect())
    }

    async fn assign_role(&self, assignment: &UserRoleAssignment) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.roles.contains_key(&assignment.role_id) {
            return Err(GatewayError::not_found("role not found"));
        }
        if !tables.users.contains_key(&assignment.user_id) {
            return Err(GatewayError::not_found("user not found"));
        }
        let key = (assignment.user_id, assignment.role_id);
        if tables.user_roles.contains_key(&key) {
            return Err(GatewayError::conflict("role already assigned to user"));
        }
        tables.user_roles.insert(key, assignment.clone());
        Ok(())
    }

    async fn unassign_role(&self, user_id: i64, role_id: i64) -> Result<()> {
        match self.tables.write().user_roles.remove(&(user_id, role_id)) {
            Some(_) => Ok(()),
            None => Err(GatewayError::not_found("role assignment not found")),
        }
    }

    async fn grant_role_permission(&self, role_id: i64, code: &str) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.roles.contains_key(&role_id) {
            return Err(GatewayError::not_found("role not found"));
        }
        tables.role_permissions.insert((role_id, code.to_string()));
        Ok(())
    }

    async fn revoke_role_permission(&self, role_id: i64, code: &str) -> Result<()> {
        if self
            .tables
            .write()
            .role_permissions
            .remove(&(role_id, code.to_string()))
        {
            Ok(())
        } else {
            Err(GatewayError::not_found("permission not granted to role"))
        }
    }

    async fn role_permissions(&self, role_id: i64) -> Result<Vec<String>> {
        Ok(self
            .tables
            .read()
            .role_permissions
            .iter()
            .filter(|(rid, _)| *rid == role_id)
            .map(|(_, code)| code.clone())
            .collect())
    }

    async fn grant_resource_permission(
        &self,
        grant: NewResourcePermission,
    ) -> Result<ResourcePermission> {
        let mut tables = self.tables.write();
        let duplicate = tables.resource_permissions.values().any(|p| {
            p.user_id == grant.user_id
                && p.resource_type == grant.resource.resource_type
                && p.resource_id == grant.resource.resource_id
                && p.permission == grant.permission
        });
        if duplicate {
            return Err(GatewayError::conflict("resource permission already granted"));
        }
        let id = tables.next_id();
        let stored = ResourcePermission {
            id,
            user_id: grant.user_id,
            resource_type: grant.resource.resource_type,
            resource_id: grant.resource.resource_id,
            permission: grant.permission,
            granted_by: grant.granted_by,
            granted_at: self.clock.now(),
        };
        tables.resource_permissions.insert(id, stored.clone());
        Ok(stored)
    }

    async fn revoke_resource_permission(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<()> {
        let mut tables = self.tables.write();
        let before = tables.resource_permissions.len();
        tables.resource_permissions.retain(|_, p| {
            !(p.user_id == user_id
                && p.resource_type == resource.resource_type
                && p.resource_id == resource.resource_id
                && p.permission == code)
        });
        if tables.resource_permissions.len() == before {
            return Err(GatewayError::not_found("resource permission not found"));
        }
        Ok(())
    }

    async fn has_resource_permission(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<bool> {
        Ok(self.tables.read().resource_permissions.values().any(|p| {
            p.user_id == user_id
                && p.resource_type == resource.resource_type
                && p.resource_id == resource.resource_id
                && p.permission == code
        }))
    }

    async fn resource_permissions_for_resource(
        &self,
        resource: &ResourceRef,
    ) -> Result<Vec<ResourcePermission>> {
        Ok(self
            .tables
            .read()
            .resource_permissions
            .values()
            .filter(|p| {
                p.resource_type == resource.resource_type && p.resource_id == resource.resource_id
            })
            .cloned()
            .collect())
    }

    async fn resource_permissions_for_user(
        &self,
        user_id: i64,
        resource_type: &str,
    ) -> Result<Vec<ResourcePermission>> {
        Ok(self
            .tables
            .read()
            .resource_permissions
            .values()
            .filter(|p| p.user_id == user_id && p.resource_type == resource_type)
            .cloned()
            .collect())
    }

    async fn insert_trusted_client(&self, client: NewTrustedClient) -> Result<TrustedClient> {
        let mut tables = self.tables.write();
        if tables
            .trusted_clients
            .values()
            .any(|c| c.api_key_hash == client.api_key_hash)
        {
            return Err(GatewayError::conflict("duplicate api key"));
        }
        let id = tables.next_id();
        let stored = TrustedClient {
            id,
            name: client.name,
            description: client.description,
            api_key_hash: client.api_key_hash,
            rate_limit_rps: client.rate_limit_rps,
            rate_limit_burst: client.rate_limit_burst,
            enabled: client.enabled,
            created_at: self.clock.now(),
            version: 1,
        };
        tables.trusted_clients.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_trusted_client(&self, id: i64) -> Result<Option<TrustedClient>> {
        Ok(self.tables.read().trusted_clients.get(&id).cloned())
    }

    async fn find_trusted_client_by_key_hash(&self, hash: &str) -> Result<Option<TrustedClient>> {
        Ok(self
            .tables
            .read()
            .trusted_clients
            .values()
            .find(|c| c.api_key_hash == hash)
            .cloned())
    }

    async fn list_trusted_clients(&self) -> Result<Vec<TrustedClient>> {
        Ok(self.tables.read().trusted_clients.values().cloned().collect())
    }

    async fn update_trusted_client(&self, client: &TrustedClient) -> Result<TrustedClient> {
        let mut tables = self.tables.write();
        match tables.trusted_clients.get_mut(&client.id) {
            Some(stored) if stored.version == client.version => {
                stored.name = client.name.clone();
                stored.description = client.description.clone();
                stored.rate_limit_rps = client.rate_limit_rps;
                stored.rate_limit_burst = client.rate_limit_burst;
                stored.enabled = client.enabled;
                stored.version += 1;
                Ok(stored.clone())
            }
            _ => Err(GatewayError::edit_conflict()),
        }
    }

    async fn replace_trusted_client_key(
        &self,
        id: i64,
        expected_version: i32,
        new_hash: &str,
    ) -> Result<TrustedClient> {
        let mut tables = self.tables.write();
        match tables.trusted_clients.get_mut(&id) {
            Some(stored) if stored.version == expected_version => {
                stored.api_key_hash = new_hash.to_string();
                stored.version += 1;
                Ok(stored.clone())
            }
            _ => Err(GatewayError::edit_conflict()),
        }
    }

    async fn delete_trusted_client(&self, id: i64) -> Result<()> {
        match self.tables.write().trusted_clients.remove(&id) {
            Some(_) => Ok(()),
            None => Err(GatewayError::not_found("trusted client not found")),
        }
    }

    async fn insert_trusted_client_log(&self, entry: TrustedClientLog) -> Result<()> {
        self.tables.write().trusted_client_logs.push(entry);
        Ok(())
    }
}
