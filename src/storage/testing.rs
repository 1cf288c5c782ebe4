//! Store wrapper for exercising interleavings and write failures in unit tests

use super::{CredentialStore, MemoryStore};
use crate::auth::rbac::{
    NewResourcePermission, NewRole, ResourcePermission, ResourceRef, Role, UserRoleAssignment,
};
use crate::auth::token::{TokenRecord, TokenScope};
use crate::auth::trusted_client::{NewTrustedClient, TrustedClient, TrustedClientLog};
use crate::auth::{NewUser, User};
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Delegates to a [`MemoryStore`]. Role reads and writes can be made to yield
/// to the scheduler first, and token writes can be made to fail.
#[derive(Debug)]
pub struct SteppedStore {
    pub inner: Arc<MemoryStore>,
    yield_on_roles: AtomicBool,
    failing_token_writes: AtomicU32,
}

impl SteppedStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            yield_on_roles: AtomicBool::new(false),
            failing_token_writes: AtomicU32::new(0),
        }
    }

    pub fn yield_on_roles(&self) {
        self.yield_on_roles.store(true, Ordering::SeqCst);
    }

    /// Fail the next `count` calls that write tokens
    pub fn fail_token_writes(&self, count: u32) {
        self.failing_token_writes.store(count, Ordering::SeqCst);
    }

    async fn step(&self) {
        if self.yield_on_roles.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }

    fn token_write(&self) -> Result<()> {
        let failing = self
            .failing_token_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match failing {
            Ok(_) => Err(GatewayError::storage("token table unavailable")),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl CredentialStore for SteppedStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        self.inner.insert_user(user).await
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.inner.get_user_by_email(email).await
    }

    async fn set_user_activated(
        &self,
        id: i64,
        activated: bool,
        expected_version: i32,
    ) -> Result<User> {
        self.inner
            .set_user_activated(id, activated, expected_version)
            .await
    }

    async fn insert_tokens(&self, tokens: &[TokenRecord]) -> Result<()> {
        self.token_write()?;
        self.inner.insert_tokens(tokens).await
    }

    async fn find_token(&self, hash: &str, scope: TokenScope) -> Result<Option<TokenRecord>> {
        self.inner.find_token(hash, scope).await
    }

    async fn rotate_refresh_tokens(
        &self,
        old_hash: &str,
        user_id: i64,
        replacement: &[TokenRecord],
    ) -> Result<Option<u64>> {
        self.token_write()?;
        self.inner
            .rotate_refresh_tokens(old_hash, user_id, replacement)
            .await
    }

    async fn delete_tokens_for_user(&self, user_id: i64, scope: TokenScope) -> Result<u64> {
        self.inner.delete_tokens_for_user(user_id, scope).await
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        self.inner.delete_expired_tokens(now).await
    }

    async fn insert_role(&self, role: NewRole) -> Result<Role> {
        self.inner.insert_role(role).await
    }

    async fn get_role(&self, id: i64) -> Result<Option<Role>> {
        self.step().await;
        self.inner.get_role(id).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.inner.list_roles().await
    }

    async fn update_role(&self, role: &Role) -> Result<Role> {
        self.step().await;
        self.inner.update_role(role).await
    }

    async fn delete_role(&self, id: i64) -> Result<()> {
        self.inner.delete_role(id).await
    }

    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>> {
        self.inner.roles_for_user(user_id).await
    }

    async fn assign_role(&self, assignment: &UserRoleAssignment) -> Result<()> {
        self.inner.assign_role(assignment).await
    }

    async fn unassign_role(&self, user_id: i64, role_id: i64) -> Result<()> {
        self.inner.unassign_role(user_id, role_id).await
    }

    async fn grant_role_permission(&self, role_id: i64, code: &str) -> Result<()> {
        self.inner.grant_role_permission(role_id, code).await
    }

    async fn revoke_role_permission(&self, role_id: i64, code: &str) -> Result<()> {
        self.inner.revoke_role_permission(role_id, code).await
    }

    async fn role_permissions(&self, role_id: i64) -> Result<Vec<String>> {
        self.inner.role_permissions(role_id).await
    }

    async fn grant_resource_permission(
        &self,
        grant: NewResourcePermission,
    ) -> Result<ResourcePermission> {
        self.inner.grant_resource_permission(grant).await
    }

    async fn revoke_resource_permission(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<()> {
        self.inner
            .revoke_resource_permission(user_id, resource, code)
            .await
    }

    async fn has_resource_permission(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<bool> {
        self.inner
            .has_resource_permission(user_id, resource, code)
            .await
    }

    async fn resource_permissions_for_resource(
        &self,
        resource: &ResourceRef,
    ) -> Result<Vec<ResourcePermission>> {
        self.inner.resource_permissions_for_resource(resource).await
    }

    async fn resource_permissions_for_user(
        &self,
        user_id: i64,
        resource_type: &str,
    ) -> Result<Vec<ResourcePermission>> {
        self.inner
            .resource_permissions_for_user(user_id, resource_type)
            .await
    }

    async fn insert_trusted_client(&self, client: NewTrustedClient) -> Result<TrustedClient> {
        self.inner.insert_trusted_client(client).await
    }

    async fn get_trusted_client(&self, id: i64) -> Result<Option<TrustedClient>> {
        self.inner.get_trusted_client(id).await
    }

    async fn find_trusted_client_by_key_hash(&self, hash: &str) -> Result<Option<TrustedClient>> {
        self.inner.find_trusted_client_by_key_hash(hash).await
    }

    async fn list_trusted_clients(&self) -> Result<Vec<TrustedClient>> {
        self.inner.list_trusted_clients().await
    }

    async fn update_trusted_client(&self, client: &TrustedClient) -> Result<TrustedClient> {
        self.inner.update_trusted_client(client).await
    }

    async fn replace_trusted_client_key(
        &self,
        id: i64,
        expected_version: i32,
        new_hash: &str,
    ) -> Result<TrustedClient> {
        self.inner
            .replace_trusted_client_key(id, expected_version, new_hash)
            .await
    }

    async fn delete_trusted_client(&self, id: i64) -> Result<()> {
        self.inner.delete_trusted_client(id).await
    }

    async fn insert_trusted_client_log(&self, entry: TrustedClientLog) -> Result<()> {
        self.inner.insert_trusted_client_log(entry).await
    }
}
