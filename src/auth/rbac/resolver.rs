//! Effective permission resolution with a TTL cache

use super::types::{PermissionRequirement, PermissionSet, ResourceRef};
use crate::storage::CredentialStore;
use crate::utils::error::{GatewayError, Result};
use moka::future::Cache;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Computes and caches effective permission sets
#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn CredentialStore>,
    /// Resolved sets by user id; staleness is bounded by the TTL
    cache: Cache<i64, Arc<PermissionSet>>,
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("cached", &self.cache.entry_count())
            .finish()
    }
}

impl PermissionResolver {
    pub fn new(store: Arc<dyn CredentialStore>, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { store, cache }
    }

    /// Union of the permissions granted to every assigned role and its
    /// ancestors. Store errors are returned, never read as "no permissions".
    pub async fn effective_permissions(&self, user_id: i64) -> Result<Arc<PermissionSet>> {
        // Concurrent misses for one user share a single load
        self.cache
            .try_get_with(user_id, self.load(user_id))
            .await
            .map_err(|shared: Arc<GatewayError>| {
                Arc::try_unwrap(shared).unwrap_or_else(|e| GatewayError::storage(e.to_string()))
            })
    }

    async fn load(&self, user_id: i64) -> Result<Arc<PermissionSet>> {
        let mut permissions = PermissionSet::new();
        let mut visited = HashSet::new();

        for role in self.store.roles_for_user(user_id).await? {
            let mut next = Some(role);
            while let Some(current) = next.take() {
                // Ancestors shared by several assigned roles are read once.
                // The same guard ends the walk if a cycle ever slipped into storage.
                if !visited.insert(current.id) {
                    break;
                }
                permissions.extend(self.store.role_permissions(current.id).await?);

                if let Some(parent_id) = current.parent_id {
                    next = self.store.get_role(parent_id).await?;
                    if next.is_none() {
                        warn!(role_id = current.id, parent_id, "dangling role parent");
                    }
                }
            }
        }

        debug!(user_id, count = permissions.len(), "resolved permissions");
        Ok(Arc::new(permissions))
    }

    /// Exact match on an explicit resource grant
    pub async fn has_resource_permission(
        &self,
        user_id: i64,
        resource: &ResourceRef,
        code: &str,
    ) -> Result<bool> {
        self.store
            .has_resource_permission(user_id, resource, code)
            .await
    }

    /// A user satisfies a requirement if it holds the code globally, or, when
    /// the requirement names a resource, holds a grant on that exact resource.
    pub async fn is_authorized(
        &self,
        user_id: i64,
        requirement: &PermissionRequirement,
    ) -> Result<bool> {
        if self
            .effective_permissions(user_id)
            .await?
            .contains(&requirement.code)
        {
            return Ok(true);
        }

        match &requirement.resource {
            Some(resource) => {
                self.has_resource_permission(user_id, resource, &requirement.code)
                    .await
            }
            None => Ok(false),
        }
    }

    /// Drop the cached set for one user
    pub async fn invalidate(&self, user_id: i64) {
        self.cache.invalidate(&user_id).await;
    }

    /// Drop every cached set
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
