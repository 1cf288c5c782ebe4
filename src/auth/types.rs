//! Principal and user types

use crate::auth::trusted_client::TrustedClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, never serialized
    #[serde(skip)]
    pub password_hash: String,
    pub activated: bool,
    pub version: i32,
}

/// Fields needed to insert a user
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub activated: bool,
}

/// Identity attached to a request
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Principal {
    /// No credential was presented
    #[default]
    Anonymous,
    /// Resolved from a valid authentication token
    User(User),
}

impl Principal {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Principal::User(user) => Some(user),
            Principal::Anonymous => None,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.user().map(|u| u.id)
    }

    pub fn is_activated(&self) -> bool {
        self.user().is_some_and(|u| u.activated)
    }
}

/// Outcome of the admission steps, carried into handlers
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub principal: Principal,
    /// Set when the request presented a valid trusted-client key
    pub trusted_client: Option<TrustedClient>,
    /// Address used for admission keying
    pub client_addr: String,
}

impl AuthContext {
    pub fn anonymous<S: Into<String>>(client_addr: S) -> Self {
        Self {
            principal: Principal::Anonymous,
            trusted_client: None,
            client_addr: client_addr.into(),
        }
    }
}
