//! Trusted client registration, key management and verification

use super::types::{
    CreateTrustedClientRequest, NewTrustedClient, TrustedClient, TrustedClientLog,
    TrustedClientWithKey, UpdateTrustedClientRequest, validate_name, validate_quota,
};
use crate::core::rate_limiter::{AdmissionKey, RateLimiter};
use crate::storage::CredentialStore;
use crate::utils::auth::crypto::keys::API_KEY_BYTES;
use crate::utils::auth::{generate_secret, hash_secret};
use crate::utils::clock::Clock;
use crate::utils::error::{GatewayError, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Trusted client handler for registration and key verification
#[derive(Clone)]
pub struct TrustedClientManager {
    store: Arc<dyn CredentialStore>,
    /// Buckets are dropped when a client's quota changes
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TrustedClientManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustedClientManager").finish_non_exhaustive()
    }
}

impl TrustedClientManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            limiter,
            clock,
        }
    }

    fn forget_bucket(&self, id: i64) {
        self.limiter.forget(&AdmissionKey::TrustedClient(id));
    }

    async fn require(&self, id: i64) -> Result<TrustedClient> {
        self.store
            .get_trusted_client(id)
            .await?
            .ok_or_else(|| GatewayError::not_found("trusted client not found"))
    }

    /// Register a client. The plaintext key is returned here and never again.
    pub async fn create(&self, request: CreateTrustedClientRequest) -> Result<TrustedClientWithKey> {
        request.validate()?;

        let api_key = generate_secret(API_KEY_BYTES);
        let client = self
            .store
            .insert_trusted_client(NewTrustedClient {
                name: request.name,
                description: request.description,
                api_key_hash: hash_secret(&api_key),
                rate_limit_rps: request.rate_limit_rps,
                rate_limit_burst: request.rate_limit_burst,
                enabled: request.enabled,
            })
            .await?;

        info!(
            client_id = client.id,
            name = %client.name,
            rps = client.rate_limit_rps,
            burst = client.rate_limit_burst,
            "trusted client created"
        );
        Ok(TrustedClientWithKey { client, api_key })
    }

    pub async fn get(&self, id: i64) -> Result<TrustedClient> {
        self.require(id).await
    }

    pub async fn list(&self) -> Result<Vec<TrustedClient>> {
        self.store.list_trusted_clients().await
    }

    /// Apply a partial update under the version check. A changed quota takes
    /// effect on the client's next request.
    pub async fn update(
        &self,
        id: i64,
        request: UpdateTrustedClientRequest,
    ) -> Result<TrustedClient> {
        let mut client = self.require(id).await?;
        if request.version.is_some_and(|v| v != client.version) {
            return Err(GatewayError::edit_conflict());
        }

        if let Some(name) = request.name {
            client.name = name;
        }
        if let Some(description) = request.description {
            client.description = description;
        }
        if let Some(rps) = request.rate_limit_rps {
            client.rate_limit_rps = rps;
        }
        if let Some(burst) = request.rate_limit_burst {
            client.rate_limit_burst = burst;
        }
        if let Some(enabled) = request.enabled {
            client.enabled = enabled;
        }
        validate_name(&client.name)?;
        validate_quota(client.rate_limit_rps, client.rate_limit_burst)?;

        let client = self.store.update_trusted_client(&client).await?;
        self.forget_bucket(id);
        info!(client_id = id, version = client.version, "trusted client updated");
        Ok(client)
    }

    pub async fn set_enabled(
        &self,
        id: i64,
        enabled: bool,
        version: Option<i32>,
    ) -> Result<TrustedClient> {
        self.update(
            id,
            UpdateTrustedClientRequest {
                enabled: Some(enabled),
                version,
                ..Default::default()
            },
        )
        .await
    }

    /// Swap in a fresh key; the previous key stops matching at once
    pub async fn regenerate_key(
        &self,
        id: i64,
        version: Option<i32>,
    ) -> Result<TrustedClientWithKey> {
        let current = self.require(id).await?;
        let expected_version = version.unwrap_or(current.version);

        let api_key = generate_secret(API_KEY_BYTES);
        let client = self
            .store
            .replace_trusted_client_key(id, expected_version, &hash_secret(&api_key))
            .await?;

        info!(client_id = id, "trusted client key regenerated");
        Ok(TrustedClientWithKey { client, api_key })
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.store.delete_trusted_client(id).await?;
        self.forget_bucket(id);
        info!(client_id = id, "trusted client deleted");
        Ok(())
    }

    /// Resolve a presented key to an enabled client
    pub async fn verify_key(&self, api_key: &str) -> Result<Option<TrustedClient>> {
        if api_key.is_empty() {
            return Ok(None);
        }

        let client = self
            .store
            .find_trusted_client_by_key_hash(&hash_secret(api_key))
            .await?;
        match client {
            Some(client) if client.enabled => Ok(Some(client)),
            Some(client) => {
                debug!(client_id = client.id, "disabled trusted client presented key");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Append one audit row for a request made by a trusted client
    pub async fn record_request(
        &self,
        client_id: i64,
        endpoint: &str,
        method: &str,
        status_code: u16,
    ) -> Result<()> {
        self.store
            .insert_trusted_client_log(TrustedClientLog {
                client_id,
                endpoint: endpoint.to_string(),
                method: method.to_string(),
                status_code,
                created_at: self.clock.now(),
            })
            .await
    }
}
