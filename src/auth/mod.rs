//! Authentication and authorization system
//!
//! [`AuthSystem`] owns the token issuer, permission resolver, role and
//! trusted-client managers, the admission controller and the gate that
//! composes them. Everything shares one [`CredentialStore`] and one clock.

pub mod gate;
pub mod rbac;
pub mod token;
pub mod trusted_client;
mod types;

pub use gate::{AuthorizationGate, Decision, DenyReason, RequestCredentials};
pub use rbac::{PermissionRequirement, PermissionResolver, ResourceRef, RoleManager};
pub use token::{TokenIssuer, TokenPair, TokenScope};
pub use trusted_client::{TrustedClient, TrustedClientManager};
pub use types::{AuthContext, NewUser, Principal, User};

use crate::config::{AuthConfig, RateLimitConfig};
use crate::core::rate_limiter::RateLimiter;
use crate::storage::CredentialStore;
use crate::utils::auth::crypto::password::validate_password;
use crate::utils::auth::hash_password;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::error::{GatewayError, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

const MAX_EMAIL_BYTES: usize = 500;

/// Main authentication system
#[derive(Debug, Clone)]
pub struct AuthSystem {
    config: Arc<AuthConfig>,
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenIssuer>,
    permissions: Arc<PermissionResolver>,
    roles: Arc<RoleManager>,
    clients: Arc<TrustedClientManager>,
    limiter: Arc<RateLimiter>,
    gate: Arc<AuthorizationGate>,
}

impl AuthSystem {
    /// Create a new authentication system on the wall clock
    pub fn new(
        config: &AuthConfig,
        rate_limit: &RateLimitConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self::with_clock(config, rate_limit, store, Arc::new(SystemClock))
    }

    /// Create a new authentication system reading time from `clock`
    pub fn with_clock(
        config: &AuthConfig,
        rate_limit: &RateLimitConfig,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!("Initializing authentication system");

        let tokens = Arc::new(TokenIssuer::new(config, store.clone(), clock.clone()));
        let permissions = Arc::new(PermissionResolver::new(
            store.clone(),
            config.permission_cache_ttl(),
            config.permission_cache_capacity,
        ));
        let roles = Arc::new(RoleManager::new(
            store.clone(),
            permissions.clone(),
            clock.clone(),
        ));
        let limiter = Arc::new(RateLimiter::with_clock(rate_limit.clone(), clock.clone()));
        let clients = Arc::new(TrustedClientManager::new(
            store.clone(),
            limiter.clone(),
            clock,
        ));
        let gate = Arc::new(AuthorizationGate::new(
            tokens.clone(),
            clients.clone(),
            limiter.clone(),
            permissions.clone(),
            config.store_timeout(),
        ));

        Self {
            config: Arc::new(config.clone()),
            store,
            tokens,
            permissions,
            roles,
            clients,
            limiter,
            gate,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }

    pub fn roles(&self) -> &RoleManager {
        &self.roles
    }

    pub fn clients(&self) -> &TrustedClientManager {
        &self.clients
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Create an inactive user and the activation token that unlocks it
    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, token::IssuedToken)> {
        if name.trim().is_empty() {
            return Err(GatewayError::validation("name must be provided"));
        }
        if email.len() > MAX_EMAIL_BYTES || !email.contains('@') {
            return Err(GatewayError::validation("email must be a valid email address"));
        }
        validate_password(password)?;

        let user = self
            .store
            .insert_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password)?,
                activated: false,
            })
            .await?;

        let activation = self
            .tokens
            .issue(user.id, self.config.activation_ttl(), TokenScope::Activation)
            .await?;

        info!(user_id = user.id, "user registered");
        Ok((user, activation))
    }

    /// Start limiter eviction and token purging
    pub fn start_background_tasks(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(2);
        if self.limiter.is_enabled() {
            handles.push(self.limiter.clone().start_cleanup_task());
        }
        if self.config.token_purge_interval > 0 {
            handles.push(
                self.tokens
                    .clone()
                    .start_purge_task(self.config.purge_interval()),
            );
        }
        handles
    }
}
