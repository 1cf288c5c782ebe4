//! Test fixtures and data factories
//!
//! Builds real auth systems over real stores. Time comes from a
//! [`ManualClock`] so expiry and refill are deterministic.

use super::database::TestDatabase;
use greenlight::auth::rbac::{NewRole, Role};
use greenlight::auth::trusted_client::{CreateTrustedClientRequest, TrustedClientWithKey};
use greenlight::auth::{AuthSystem, NewUser, RequestCredentials, TokenPair, User};
use greenlight::config::{AuthConfig, Config, RateLimitConfig, StorageBackend};
use greenlight::storage::{CredentialStore, MemoryStore};
use greenlight::utils::auth::hash_password;
use greenlight::utils::clock::ManualClock;
use std::sync::Arc;

/// Password every fixture user is created with
pub const PASSWORD: &str = "pa55word-for-tests";

/// An auth system plus handles on its store and clock
pub struct Harness {
    pub auth: AuthSystem,
    pub store: Arc<dyn CredentialStore>,
    pub clock: Arc<ManualClock>,
    /// Kept alive so the SQLite connection outlives the test
    pub database: Option<TestDatabase>,
}

impl Harness {
    /// Harness over a migrated in-memory SQLite database
    pub async fn sqlite() -> Self {
        Self::sqlite_with(RateLimitConfig::default()).await
    }

    pub async fn sqlite_with(rate_limit: RateLimitConfig) -> Self {
        let clock = Arc::new(ManualClock::default());
        let database = TestDatabase::with_clock(clock.clone()).await;
        let store: Arc<dyn CredentialStore> = database.store_arc();
        Self::build(store, clock, rate_limit, Some(database))
    }

    /// Harness over the process-local store
    pub fn memory() -> Self {
        Self::memory_with(RateLimitConfig::default())
    }

    pub fn memory_with(rate_limit: RateLimitConfig) -> Self {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        Self::build(store, clock, rate_limit, None)
    }

    fn build(
        store: Arc<dyn CredentialStore>,
        clock: Arc<ManualClock>,
        rate_limit: RateLimitConfig,
        database: Option<TestDatabase>,
    ) -> Self {
        let auth = AuthSystem::with_clock(
            &AuthConfig::default(),
            &rate_limit,
            store.clone(),
            clock.clone(),
        );
        Self {
            auth,
            store,
            clock,
            database,
        }
    }

    /// Configuration matching this harness, for building an HTTP app
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        config.rate_limit = self.auth.limiter().config().clone();
        config
    }

    /// Insert a user directly, bypassing registration
    pub async fn user(&self, email: &str, activated: bool) -> User {
        self.store
            .insert_user(NewUser {
                name: email.split('@').next().unwrap_or("user").to_string(),
                email: email.to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                activated,
            })
            .await
            .unwrap()
    }

    /// Insert an activated user and log them in
    pub async fn logged_in(&self, email: &str) -> (User, TokenPair) {
        self.user(email, true).await;
        self.auth.tokens().login(email, PASSWORD).await.unwrap()
    }

    pub async fn role(&self, name: &str, parent: Option<&Role>, permissions: &[&str]) -> Role {
        let role = self
            .auth
            .roles()
            .create_role(NewRole {
                name: name.to_string(),
                description: String::new(),
                parent_id: parent.map(|p| p.id),
            })
            .await
            .unwrap();
        for code in permissions {
            self.auth
                .roles()
                .grant_permission(role.id, code)
                .await
                .unwrap();
        }
        role
    }

    pub async fn trusted_client(&self, name: &str, rps: f64, burst: u32) -> TrustedClientWithKey {
        self.auth
            .clients()
            .create(CreateTrustedClientRequest {
                name: name.to_string(),
                description: String::new(),
                rate_limit_rps: rps,
                rate_limit_burst: burst,
                enabled: true,
            })
            .await
            .unwrap()
    }
}

/// Credentials for an anonymous caller at `addr`
pub fn anonymous(addr: &str) -> RequestCredentials {
    RequestCredentials::anonymous(addr)
}

/// Credentials carrying the access half of `pair`
pub fn bearer(addr: &str, pair: &TokenPair) -> RequestCredentials {
    RequestCredentials::anonymous(addr).with_bearer(pair.access.plaintext.clone())
}
