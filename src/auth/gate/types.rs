//! Gate inputs and outcomes

use crate::auth::AuthContext;
use crate::utils::error::GatewayError;
use std::fmt;

/// What the HTTP layer extracted from one request
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    /// Raw `Authorization` header
    pub authorization: Option<String>,
    /// Raw `X-API-Key` header
    pub api_key: Option<String>,
    /// Caller address used for anonymous admission keying
    pub client_addr: String,
}

impl RequestCredentials {
    pub fn anonymous<S: Into<String>>(client_addr: S) -> Self {
        Self {
            client_addr: client_addr.into(),
            ..Default::default()
        }
    }

    pub fn with_bearer<S: Into<String>>(mut self, token: S) -> Self {
        self.authorization = Some(format!("Bearer {}", token.into()));
        self
    }

    pub fn with_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// Parse an `Authorization` header.
///
/// `Ok(None)` means no credential; anything other than `Bearer <token>` is
/// a malformed token.
pub fn parse_bearer(header: Option<&str>) -> Result<Option<&str>, GatewayError> {
    let Some(header) = header else {
        return Ok(None);
    };
    match header.split_once(' ') {
        Some(("Bearer", token)) if !token.is_empty() && !token.contains(' ') => Ok(Some(token)),
        _ => Err(GatewayError::MalformedToken),
    }
}

/// Why a request was refused. Denials are expected outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Malformed or unknown token
    InvalidCredential,
    /// Token matched but is past its expiry
    ExpiredCredential,
    /// Admission controller refused the request
    RateLimited { retry_after: Option<u64> },
    /// The operation needs a user and none was presented
    AuthenticationRequired,
    /// The user exists but has not been activated
    InactiveAccount,
    /// Neither a global nor a resource grant covers the requirement
    Forbidden,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DenyReason::InvalidCredential => "invalid_credential",
            DenyReason::ExpiredCredential => "expired_credential",
            DenyReason::RateLimited { .. } => "rate_limited",
            DenyReason::AuthenticationRequired => "authentication_required",
            DenyReason::InactiveAccount => "inactive_account",
            DenyReason::Forbidden => "forbidden",
        })
    }
}

impl DenyReason {
    /// Classify a credential failure returned by the issuer
    pub fn from_credential_error(err: &GatewayError) -> Option<Self> {
        match err {
            GatewayError::MalformedToken
            | GatewayError::InvalidToken
            | GatewayError::InvalidApiKey => Some(DenyReason::InvalidCredential),
            GatewayError::ExpiredToken => Some(DenyReason::ExpiredCredential),
            _ => None,
        }
    }

    /// Error the HTTP layer renders for this denial
    pub fn into_error(self) -> GatewayError {
        match self {
            DenyReason::InvalidCredential => GatewayError::InvalidToken,
            DenyReason::ExpiredCredential => GatewayError::ExpiredToken,
            DenyReason::RateLimited { retry_after } => {
                GatewayError::rate_limit("too many requests", retry_after)
            }
            DenyReason::AuthenticationRequired => GatewayError::Unauthenticated,
            DenyReason::InactiveAccount => GatewayError::InactiveAccount,
            DenyReason::Forbidden => GatewayError::forbidden(
                "your user account doesn't have the necessary permissions to access this resource",
            ),
        }
    }
}

/// One decision per request
#[derive(Debug, Clone)]
pub enum Decision {
    Allow(AuthContext),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Allow(_) => None,
            Decision::Deny(reason) => Some(*reason),
        }
    }

    /// Turn a denial into the error the HTTP layer responds with
    pub fn into_result(self) -> Result<AuthContext, GatewayError> {
        match self {
            Decision::Allow(ctx) => Ok(ctx),
            Decision::Deny(reason) => Err(reason.into_error()),
        }
    }
}
