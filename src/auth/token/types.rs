//! Token types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    Authentication,
    Refresh,
    Activation,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Authentication => "authentication",
            TokenScope::Refresh => "refresh",
            TokenScope::Activation => "activation",
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authentication" => Ok(TokenScope::Authentication),
            "refresh" => Ok(TokenScope::Refresh),
            "activation" => Ok(TokenScope::Activation),
            other => Err(format!("unknown token scope: {}", other)),
        }
    }
}

/// Lifecycle state of a token, reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Issued,
    Valid,
    ConsumedByRotation,
    Expired,
    Revoked,
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenState::Issued => "issued",
            TokenState::Valid => "valid",
            TokenState::ConsumedByRotation => "consumed_by_rotation",
            TokenState::Expired => "expired",
            TokenState::Revoked => "revoked",
        })
    }
}

/// Persisted form of a token. The plaintext never reaches this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    /// Hex sha256 of the plaintext
    pub hash: String,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub scope: TokenScope,
    pub is_refresh: bool,
}

impl TokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }
}

/// Freshly issued token; the only place the plaintext exists
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    #[serde(rename = "token")]
    pub plaintext: String,
    pub expiry: DateTime<Utc>,
    #[serde(skip)]
    pub record: TokenRecord,
}

/// Access/refresh tokens issued together
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    #[serde(rename = "authentication_token")]
    pub access: IssuedToken,
    #[serde(rename = "refresh_token")]
    pub refresh: IssuedToken,
}

impl TokenPair {
    /// Rows to persist, access first
    pub fn records(&self) -> [TokenRecord; 2] {
        [self.access.record.clone(), self.refresh.record.clone()]
    }
}
