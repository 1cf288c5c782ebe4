//! Token issuance, authentication and rotation

use super::types::{IssuedToken, TokenPair, TokenRecord, TokenScope, TokenState};
use crate::auth::User;
use crate::config::AuthConfig;
use crate::storage::CredentialStore;
use crate::utils::auth::crypto::keys::TOKEN_BYTES;
use crate::utils::auth::{generate_secret, hash_secret, is_well_formed_token, verify_password};
use crate::utils::clock::Clock;
use crate::utils::error::{GatewayError, Result};
use chrono::Duration;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Creates and validates tokens against the credential store
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig, store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
        }
    }

    fn mint(&self, user_id: i64, ttl: Duration, scope: TokenScope) -> IssuedToken {
        let plaintext = generate_secret(TOKEN_BYTES);
        let expiry = self.clock.now() + ttl;
        let record = TokenRecord {
            hash: hash_secret(&plaintext),
            user_id,
            expiry,
            scope,
            is_refresh: scope == TokenScope::Refresh,
        };
        IssuedToken {
            plaintext,
            expiry,
            record,
        }
    }

    /// Issue and persist a single token of any scope
    pub async fn issue(&self, user_id: i64, ttl: Duration, scope: TokenScope) -> Result<IssuedToken> {
        let token = self.mint(user_id, ttl, scope);
        self.store
            .insert_tokens(std::slice::from_ref(&token.record))
            .await?;
        debug!(user_id, scope = %scope, state = %TokenState::Issued, "token issued");
        Ok(token)
    }

    /// Issue an access/refresh pair with the configured TTLs
    pub async fn issue_pair(&self, user_id: i64) -> Result<TokenPair> {
        self.issue_pair_with_ttl(user_id, self.access_ttl, self.refresh_ttl)
            .await
    }

    /// Issue an access/refresh pair. Both rows are written in one store call,
    /// so either the whole pair exists or neither token does.
    pub async fn issue_pair_with_ttl(
        &self,
        user_id: i64,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<TokenPair> {
        let pair = self.mint_pair(user_id, access_ttl, refresh_ttl);
        self.store.insert_tokens(&pair.records()).await?;

        info!(user_id, state = %TokenState::Issued, "token pair issued");
        Ok(pair)
    }

    fn mint_pair(&self, user_id: i64, access_ttl: Duration, refresh_ttl: Duration) -> TokenPair {
        TokenPair {
            access: self.mint(user_id, access_ttl, TokenScope::Authentication),
            refresh: self.mint(user_id, refresh_ttl, TokenScope::Refresh),
        }
    }

    /// Resolve the user owning an unexpired authentication token
    pub async fn authenticate(&self, plaintext: &str) -> Result<User> {
        if !is_well_formed_token(plaintext) {
            return Err(GatewayError::MalformedToken);
        }

        let hash = hash_secret(plaintext);
        let record = self
            .store
            .find_token(&hash, TokenScope::Authentication)
            .await?
            .ok_or(GatewayError::InvalidToken)?;

        if record.is_expired_at(self.clock.now()) {
            debug!(user_id = record.user_id, state = %TokenState::Expired, "authentication token expired");
            return Err(GatewayError::InvalidToken);
        }

        self.store
            .get_user(record.user_id)
            .await?
            .ok_or(GatewayError::InvalidToken)
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// Consuming the presented token, revoking the user's other refresh
    /// tokens and storing the new pair is one store call. When two rotations
    /// race on a token only one of them finds it. When the write fails
    /// nothing changes and the same token can be presented again.
    pub async fn rotate_refresh(&self, plaintext: &str) -> Result<TokenPair> {
        if !is_well_formed_token(plaintext) {
            return Err(GatewayError::MalformedToken);
        }

        let hash = hash_secret(plaintext);
        let record = self
            .store
            .find_token(&hash, TokenScope::Refresh)
            .await?
            .ok_or(GatewayError::InvalidToken)?;

        if record.is_expired_at(self.clock.now()) {
            debug!(user_id = record.user_id, state = %TokenState::Expired, "refresh token expired");
            return Err(GatewayError::ExpiredToken);
        }

        if self.store.get_user(record.user_id).await?.is_none() {
            return Err(GatewayError::InvalidToken);
        }

        let pair = self.mint_pair(record.user_id, self.access_ttl, self.refresh_ttl);
        let revoked = self
            .store
            .rotate_refresh_tokens(&hash, record.user_id, &pair.records())
            .await?
            .ok_or(GatewayError::InvalidToken)?;

        info!(
            user_id = record.user_id,
            revoked,
            state = %TokenState::ConsumedByRotation,
            "refresh token rotated"
        );
        Ok(pair)
    }

    /// Verify email and password, then issue a pair.
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair)> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(GatewayError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            debug!(user_id = user.id, "password mismatch");
            return Err(GatewayError::InvalidCredentials);
        }
        if !user.activated {
            return Err(GatewayError::InactiveAccount);
        }

        let pair = self.issue_pair(user.id).await?;
        Ok((user, pair))
    }

    /// Consume an activation token and mark its owner activated
    pub async fn activate(&self, plaintext: &str) -> Result<User> {
        if !is_well_formed_token(plaintext) {
            return Err(GatewayError::MalformedToken);
        }

        let record = self
            .store
            .find_token(&hash_secret(plaintext), TokenScope::Activation)
            .await?
            .filter(|r| !r.is_expired_at(self.clock.now()))
            .ok_or(GatewayError::InvalidToken)?;

        let user = self
            .store
            .get_user(record.user_id)
            .await?
            .ok_or(GatewayError::InvalidToken)?;

        let user = self
            .store
            .set_user_activated(user.id, true, user.version)
            .await?;
        self.store
            .delete_tokens_for_user(user.id, TokenScope::Activation)
            .await?;

        info!(user_id = user.id, "user activated");
        Ok(user)
    }

    /// Delete every token of `scope` held by the user
    pub async fn revoke_all(&self, user_id: i64, scope: TokenScope) -> Result<u64> {
        let revoked = self.store.delete_tokens_for_user(user_id, scope).await?;
        info!(user_id, scope = %scope, revoked, state = %TokenState::Revoked, "tokens revoked");
        Ok(revoked)
    }

    /// Remove expired rows. Expiry is already enforced at read time.
    pub async fn purge_expired(&self) -> Result<u64> {
        let purged = self.store.delete_expired_tokens(self.clock.now()).await?;
        if purged > 0 {
            debug!(purged, state = %TokenState::Expired, "expired tokens purged");
        }
        Ok(purged)
    }

    /// Run [`purge_expired`](Self::purge_expired) every `interval`
    pub fn start_purge_task(self: Arc<Self>, interval: std::time::Duration) -> JoinHandle<()> {
        let period = interval.max(std::time::Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.purge_expired().await {
                    warn!(error = %e, "token purge failed");
                }
            }
        })
    }
}
