//! Authorization gate implementation

use super::types::{Decision, DenyReason, RequestCredentials, parse_bearer};
use crate::auth::rbac::{PermissionRequirement, PermissionResolver};
use crate::auth::token::TokenIssuer;
use crate::auth::trusted_client::TrustedClientManager;
use crate::auth::{AuthContext, Principal};
use crate::core::rate_limiter::{AdmissionKey, RateLimiter};
use crate::utils::error::{GatewayError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Composes the issuer, the admission controller and the resolver into one
/// decision per request
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    issuer: Arc<TokenIssuer>,
    clients: Arc<TrustedClientManager>,
    limiter: Arc<RateLimiter>,
    resolver: Arc<PermissionResolver>,
    /// Upper bound on each store round trip
    store_timeout: Duration,
}

impl AuthorizationGate {
    pub fn new(
        issuer: Arc<TokenIssuer>,
        clients: Arc<TrustedClientManager>,
        limiter: Arc<RateLimiter>,
        resolver: Arc<PermissionResolver>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            issuer,
            clients,
            limiter,
            resolver,
            store_timeout,
        }
    }

    /// Run `fut` under the store timeout. Dropping the future on expiry
    /// abandons the round trip.
    pub(super) async fn bounded<T>(
        &self,
        step: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(Err(e)) if e.is_storage_failure() => {
                warn!(step, error = %e, "credential store failure");
                Err(e)
            }
            Ok(result) => result,
            Err(_) => {
                warn!(
                    step,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "credential store timed out"
                );
                Err(GatewayError::timeout(format!("{step} timed out")))
            }
        }
    }

    /// Full decision: admission steps, then the requirement if one is given
    pub async fn authorize(
        &self,
        credentials: &RequestCredentials,
        requirement: Option<&PermissionRequirement>,
    ) -> Result<Decision> {
        match self.admit_request(credentials).await? {
            Decision::Allow(ctx) => match requirement {
                Some(requirement) => self.check_requirement(ctx, requirement).await,
                None => Ok(Decision::Allow(ctx)),
            },
            deny => Ok(deny),
        }
    }

    /// Authenticate the credential and consult the admission controller.
    ///
    /// Credential and admission denials come back as [`Decision::Deny`];
    /// store failures and timeouts come back as errors.
    pub async fn admit_request(&self, credentials: &RequestCredentials) -> Result<Decision> {
        let bearer = match parse_bearer(credentials.authorization.as_deref()) {
            Ok(bearer) => bearer,
            Err(_) => {
                debug!(addr = %credentials.client_addr, "malformed authorization header");
                return Ok(Decision::Deny(DenyReason::InvalidCredential));
            }
        };

        let principal = match bearer {
            None => Principal::Anonymous,
            Some(token) => match self.bounded("authenticate", self.issuer.authenticate(token)).await {
                Ok(user) => Principal::User(user),
                Err(e) => match DenyReason::from_credential_error(&e) {
                    Some(reason) => {
                        debug!(addr = %credentials.client_addr, %reason, "credential rejected");
                        return Ok(Decision::Deny(reason));
                    }
                    None => return Err(e),
                },
            },
        };

        // An unknown or disabled key is not an error; the caller is keyed by
        // address like any other anonymous request. The lookup runs even with
        // rate limiting off, since handlers and the request audit log read the
        // client from the context.
        let trusted_client = match credentials.api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                self.bounded("verify_key", self.clients.verify_key(key))
                    .await?
            }
            _ => None,
        };

        let (key, params) = match &trusted_client {
            Some(client) => (AdmissionKey::TrustedClient(client.id), client.bucket_params()),
            None => (
                AdmissionKey::Address(credentials.client_addr.clone()),
                self.limiter.default_params(),
            ),
        };

        let admission = self.limiter.check_and_record(&key, params);
        if !admission.allowed {
            return Ok(Decision::Deny(DenyReason::RateLimited {
                retry_after: admission.retry_after_secs,
            }));
        }

        Ok(Decision::Allow(AuthContext {
            principal,
            trusted_client,
            client_addr: credentials.client_addr.clone(),
        }))
    }

    /// Check a requirement against an admitted request: a user must be
    /// present and activated, then a global or resource grant must cover it.
    pub async fn check_requirement(
        &self,
        ctx: AuthContext,
        requirement: &PermissionRequirement,
    ) -> Result<Decision> {
        let Some(user) = ctx.principal.user() else {
            return Ok(Decision::Deny(DenyReason::AuthenticationRequired));
        };
        if !user.activated {
            return Ok(Decision::Deny(DenyReason::InactiveAccount));
        }

        let user_id = user.id;
        let authorized = self
            .bounded(
                "resolve_permissions",
                self.resolver.is_authorized(user_id, requirement),
            )
            .await?;

        if authorized {
            Ok(Decision::Allow(ctx))
        } else {
            debug!(user_id, permission = %requirement.code, resource = ?requirement.resource, "permission denied");
            Ok(Decision::Deny(DenyReason::Forbidden))
        }
    }
}
