use crate::auth::rbac::{
    NewResourcePermission, NewRole, ResourcePermission, ResourceRef, Role, UserRoleAssignment,
};
use crate::auth::token::{TokenRecord, TokenScope};
use crate::auth::trusted_client::{NewTrustedClient, TrustedClient, TrustedClientLog};
use crate::auth::{NewUser, User};
use crate::storage::CredentialStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::SeaOrmStore;

#[async_trait]
impl CredentialStore for SeaOrmStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        self.insert_user_row(user).await
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.find_user_by_id(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_user_by_email(email).await
    }

    async fn set_user_activated(
        &self,
        id: i64,
        activated: bool,
        expected_version: i32,
    ) -> Result<User> {
        self.update_user_activation(id, activated, expected_version)
            .await
    }

    async fn insert_tokens(&self, tokens: &[TokenRecord]) -> Result<()> {
        self.insert_token_rows(tokens).await
    }

    async fn find_token(&self, hash: &str, scope: TokenScope) -> Result<Option<TokenRecord>> {
        self.find_token_row(hash, scope).await
    }

    async fn rotate_refresh_tokens(
        &self,
        old_hash: &str,
        user_id: i64,
        replacement: &[TokenRecord],
    ) -> Result<Option<u64>> {
        self.rotate_refresh_token_rows(old_hash, user_id, replacement)
            .await
    }

    async fn delete_tokens_for_user(&self, user_id: i64, scope: TokenScope) -> Result<u64> {
        self.delete_token_rows_for_user(user_id, scope).await
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        self.delete_expired_token_rows(now).await
    }

    async fn insert_role(&self, role: NewRole) -> Result<Role> {
        self.insert_role_row(role).await
    }

    async fn get_role(&self, id: i64) -> Result<Option<Role>> {
        self.find_role_by_id(id).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.list_role_rows().await
    }

    async fn update_role(&self, role: &Role) -> Result<Role> {
        self.update_role_row(role).await
    }

    async fn delete_role(&self, id: i64) -> Result<()> {
        self.delete_role_row(id).await
    }

    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>> {
        self.role_rows_for_user(user_id).await
    }

    async fn assign_role(&self, assignment: &UserRoleAssignment) -> Result<()> {
        self.insert_assignment(assignment).await
    }

    async fn unassign_role(&self, user_id: i64, role_id: i64) -> Result<()> {
        self.delete_assignment(user_id, role_id).await
    }

    async fn grant_role_permission(&self, role_id: i64, code: &str) -> Result<()> {
        self.insert_role_permission(role_id, code).await
    }

    async fn revoke_role_permission(&self, role_id: i64, code: &str) -> Result<()> {
        self.delete_role_permission(role_id, code).await
    }

    async fn role_permissions(&self, role_id: i64) -> Result<Vec<String>> {
        self.role_permission_codes(role_id).await
    }

    async fn grant_resource_permission(
        &self,
        grant: NewResourcePermission,
    ) -> Result<ResourcePermission> {
        self.insert_resource_permission(grant).await
    }

    async fn revoke_resource_permission(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<()> {
        self.delete_resource_permission(user_id, resource, code)
            .await
    }

    async fn has_resource_permission(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<bool> {
        self.resource_permission_exists(user_id, resource, code)
            .await
    }

    async fn resource_permissions_for_resource(
        &self,
        resource: &ResourceRef,
    ) -> Result<Vec<ResourcePermission>> {
        self.resource_permission_rows_for_resource(resource).await
    }

    async fn resource_permissions_for_user(
        &self,
        user_id: i64,
        resource_type: &str,
    ) -> Result<Vec<ResourcePermission>> {
        self.resource_permission_rows_for_user(user_id, resource_type)
            .await
    }

    async fn insert_trusted_client(&self, client: NewTrustedClient) -> Result<TrustedClient> {
        self.insert_trusted_client_row(client).await
    }

    async fn get_trusted_client(&self, id: i64) -> Result<Option<TrustedClient>> {
        self.find_trusted_client_by_id(id).await
    }

    async fn find_trusted_client_by_key_hash(&self, hash: &str) -> Result<Option<TrustedClient>> {
        self.find_trusted_client_row_by_hash(hash).await
    }

    async fn list_trusted_clients(&self) -> Result<Vec<TrustedClient>> {
        self.list_trusted_client_rows().await
    }

    async fn update_trusted_client(&self, client: &TrustedClient) -> Result<TrustedClient> {
        self.update_trusted_client_row(client).await
    }

    async fn replace_trusted_client_key(
        &self,
        id: i64,
        expected_version: i32,
        new_hash: &str,
    ) -> Result<TrustedClient> {
        self.replace_trusted_client_key_hash(id, expected_version, new_hash)
            .await
    }

    async fn delete_trusted_client(&self, id: i64) -> Result<()> {
        self.delete_trusted_client_row(id).await
    }

    async fn insert_trusted_client_log(&self, entry: TrustedClientLog) -> Result<()> {
        self.insert_trusted_client_log_row(entry).await
    }
}
