//! Credential storage
//!
//! [`CredentialStore`] is the narrow interface the admission core consumes.
//! Two implementations ship with the crate: [`SeaOrmStore`] over a relational
//! database and [`MemoryStore`] for tests and development.
//!
//! Every update of a versioned record is a compare-and-swap on `version`:
//! the caller passes the version it read, and a mismatch fails with
//! [`GatewayError::Conflict`](crate::utils::error::GatewayError::Conflict).

/// Database storage module
pub mod database;
/// In-memory storage module
pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use database::SeaOrmStore;
pub use memory::MemoryStore;

use crate::auth::rbac::{
    NewResourcePermission, NewRole, ResourcePermission, ResourceRef, Role, UserRoleAssignment,
};
use crate::auth::token::{TokenRecord, TokenScope};
use crate::auth::trusted_client::{NewTrustedClient, TrustedClient, TrustedClientLog};
use crate::auth::{NewUser, User};
use crate::config::{StorageBackend, StorageConfig};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Durable mapping from hashed secrets to principals, plus the RBAC and
/// trusted-client records the admission core reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    // ---- users ----

    /// Insert a user; a duplicate email is a conflict
    async fn insert_user(&self, user: NewUser) -> Result<User>;
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Set the activation flag if `expected_version` still matches
    async fn set_user_activated(
        &self,
        id: i64,
        activated: bool,
        expected_version: i32,
    ) -> Result<User>;

    // ---- tokens ----

    /// Insert all rows or none
    async fn insert_tokens(&self, tokens: &[TokenRecord]) -> Result<()>;
    /// Look up by hash and scope, regardless of expiry
    async fn find_token(&self, hash: &str, scope: TokenScope) -> Result<Option<TokenRecord>>;
    /// Consume the refresh token `old_hash`, revoke the rest of the user's
    /// refresh tokens and insert `replacement`, all or nothing. `None` when
    /// `old_hash` no longer exists, in which case nothing is written.
    /// Otherwise the number of refresh tokens revoked, `old_hash` included.
    async fn rotate_refresh_tokens(
        &self,
        old_hash: &str,
        user_id: i64,
        replacement: &[TokenRecord],
    ) -> Result<Option<u64>>;
    async fn delete_tokens_for_user(&self, user_id: i64, scope: TokenScope) -> Result<u64>;
    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64>;

    // ---- roles ----

    /// Insert a role; a duplicate name is a conflict
    async fn insert_role(&self, role: NewRole) -> Result<Role>;
    async fn get_role(&self, id: i64) -> Result<Option<Role>>;
    async fn list_roles(&self) -> Result<Vec<Role>>;
    /// Persist name, description and parent if `role.version` still matches.
    /// Returns the stored row with its bumped version.
    async fn update_role(&self, role: &Role) -> Result<Role>;
    /// Delete a role; roles naming it as parent become roots
    async fn delete_role(&self, id: i64) -> Result<()>;
    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>>;
    async fn assign_role(&self, assignment: &UserRoleAssignment) -> Result<()>;
    async fn unassign_role(&self, user_id: i64, role_id: i64) -> Result<()>;

    // ---- role permissions ----

    /// Grant `code` to a role, creating the permission if unseen. Idempotent.
    async fn grant_role_permission(&self, role_id: i64, code: &str) -> Result<()>;
    async fn revoke_role_permission(&self, role_id: i64, code: &str) -> Result<()>;
    /// Codes granted directly to `role_id`, not including ancestors
    async fn role_permissions(&self, role_id: i64) -> Result<Vec<String>>;

    // ---- resource permissions ----

    /// Insert a resource grant; a duplicate tuple is a conflict
    async fn grant_resource_permission(
        &self,
        grant: NewResourcePermission,
    ) -> Result<ResourcePermission>;
    async fn revoke_resource_permission(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<()>;
    async fn has_resource_permission(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<bool>;
    async fn resource_permissions_for_resource(
        &self,
        resource: &ResourceRef,
    ) -> Result<Vec<ResourcePermission>>;
    async fn resource_permissions_for_user(
        &self,
        user_id: i64,
        resource_type: &str,
    ) -> Result<Vec<ResourcePermission>>;

    // ---- trusted clients ----

    async fn insert_trusted_client(&self, client: NewTrustedClient) -> Result<TrustedClient>;
    async fn get_trusted_client(&self, id: i64) -> Result<Option<TrustedClient>>;
    async fn find_trusted_client_by_key_hash(&self, hash: &str) -> Result<Option<TrustedClient>>;
    async fn list_trusted_clients(&self) -> Result<Vec<TrustedClient>>;
    /// Persist everything except the key hash if `client.version` still matches
    async fn update_trusted_client(&self, client: &TrustedClient) -> Result<TrustedClient>;
    /// Swap the key hash in one step so the old key stops matching immediately
    async fn replace_trusted_client_key(
        &self,
        id: i64,
        expected_version: i32,
        new_hash: &str,
    ) -> Result<TrustedClient>;
    async fn delete_trusted_client(&self, id: i64) -> Result<()>;
    async fn insert_trusted_client_log(&self, entry: TrustedClientLog) -> Result<()>;
}

impl std::fmt::Debug for dyn CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialStore")
    }
}

/// Build the configured store
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn CredentialStore>> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory credential store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Database => {
            let store = SeaOrmStore::new(&config.database).await?;
            if config.database.run_migrations {
                store.migrate().await?;
            }
            Ok(Arc::new(store))
        }
    }
}
