//! SeaORM store behaviour on SQLite

#[cfg(test)]
mod tests {
    use crate::common::TestDatabase;
    use crate::common::database::test_db_config;
    use crate::{assert_gateway_err, assert_ok};
    use chrono::{Duration, TimeZone, Utc};
    use greenlight::GatewayError;
    use greenlight::auth::rbac::NewRole;
    use greenlight::auth::token::{TokenRecord, TokenScope};
    use greenlight::auth::trusted_client::{NewTrustedClient, TrustedClientLog};
    use greenlight::auth::NewUser;
    use greenlight::storage::{CredentialStore, SeaOrmStore};
    use greenlight::storage::database::seaorm_db::DatabaseBackendType;
    use greenlight::utils::clock::ManualClock;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            activated: false,
        }
    }

    fn token(hash: &str, user_id: i64, scope: TokenScope) -> TokenRecord {
        TokenRecord {
            hash: hash.to_string(),
            user_id,
            expiry: Utc::now() + Duration::hours(1),
            scope,
            is_refresh: scope == TokenScope::Refresh,
        }
    }

    #[tokio::test]
    async fn test_connect_migrate_and_ping() {
        let store = assert_ok!(SeaOrmStore::new(&test_db_config()).await);
        assert_eq!(store.backend_type(), DatabaseBackendType::SQLite);
        assert_ok!(store.migrate().await);
        // Migrations are idempotent
        assert_ok!(store.migrate().await);
        assert_ok!(store.health_check().await);
    }

    #[tokio::test]
    async fn test_user_email_is_unique_and_activation_is_versioned() {
        let db = TestDatabase::new().await;
        let store = db.store();

        let user = assert_ok!(store.insert_user(new_user("a@example.com")).await);
        assert_eq!(user.version, 1);
        assert_gateway_err!(
            store.insert_user(new_user("a@example.com")).await,
            GatewayError::Conflict(_)
        );

        let found = store.get_user_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        let activated = assert_ok!(store.set_user_activated(user.id, true, 1).await);
        assert!(activated.activated);
        assert_eq!(activated.version, 2);
        assert_gateway_err!(
            store.set_user_activated(user.id, false, 1).await,
            GatewayError::Conflict(_)
        );
    }

    #[tokio::test]
    async fn test_token_batch_insert_is_all_or_nothing() {
        let db = TestDatabase::new().await;
        let store = db.store();
        let user = store.insert_user(new_user("b@example.com")).await.unwrap();

        store
            .insert_tokens(&[token("h1", user.id, TokenScope::Authentication)])
            .await
            .unwrap();

        // The second row collides, so the first must not land either
        assert!(
            store
                .insert_tokens(&[
                    token("h2", user.id, TokenScope::Authentication),
                    token("h1", user.id, TokenScope::Refresh),
                ])
                .await
                .is_err()
        );
        assert!(store.find_token("h2", TokenScope::Authentication).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_deletes() {
        let db = TestDatabase::new().await;
        let store = db.store();
        let user = store.insert_user(new_user("c@example.com")).await.unwrap();

        let mut expired = token("old", user.id, TokenScope::Authentication);
        expired.expiry = Utc::now() - Duration::minutes(1);
        store
            .insert_tokens(&[
                expired,
                token("r1", user.id, TokenScope::Refresh),
                token("r2", user.id, TokenScope::Refresh),
                token("a1", user.id, TokenScope::Authentication),
            ])
            .await
            .unwrap();

        assert_eq!(store.delete_expired_tokens(Utc::now()).await.unwrap(), 1);
        assert_eq!(
            store.delete_tokens_for_user(user.id, TokenScope::Refresh).await.unwrap(),
            2
        );
        assert!(store.find_token("r1", TokenScope::Refresh).await.unwrap().is_none());
        assert!(store.find_token("a1", TokenScope::Authentication).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_refresh_rotation_has_one_winner() {
        let db = TestDatabase::new().await;
        let store = db.store();
        let user = store.insert_user(new_user("rot@example.com")).await.unwrap();
        store
            .insert_tokens(&[
                token("r1", user.id, TokenScope::Refresh),
                token("r2", user.id, TokenScope::Refresh),
                token("a1", user.id, TokenScope::Authentication),
            ])
            .await
            .unwrap();

        let first = assert_ok!(
            store
                .rotate_refresh_tokens(
                    "r1",
                    user.id,
                    &[
                        token("a2", user.id, TokenScope::Authentication),
                        token("r3", user.id, TokenScope::Refresh),
                    ],
                )
                .await
        );
        assert_eq!(first, Some(2));
        assert!(store.find_token("r2", TokenScope::Refresh).await.unwrap().is_none());
        assert!(store.find_token("r3", TokenScope::Refresh).await.unwrap().is_some());
        assert!(store.find_token("a1", TokenScope::Authentication).await.unwrap().is_some());

        // Already consumed, and nothing from the second batch lands
        let second = assert_ok!(
            store
                .rotate_refresh_tokens("r1", user.id, &[token("r4", user.id, TokenScope::Refresh)])
                .await
        );
        assert_eq!(second, None);
        assert!(store.find_token("r4", TokenScope::Refresh).await.unwrap().is_none());

        // An authentication hash is never consumed as a refresh token
        assert_eq!(
            store.rotate_refresh_tokens("a1", user.id, &[]).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_failed_rotation_leaves_refresh_token_in_place() {
        let db = TestDatabase::new().await;
        let store = db.store();
        let user = store.insert_user(new_user("rb@example.com")).await.unwrap();
        store
            .insert_tokens(&[
                token("r1", user.id, TokenScope::Refresh),
                token("r2", user.id, TokenScope::Refresh),
                token("a1", user.id, TokenScope::Authentication),
            ])
            .await
            .unwrap();

        // The replacement collides with a surviving row, so the whole rotation rolls back
        assert_gateway_err!(
            store
                .rotate_refresh_tokens(
                    "r1",
                    user.id,
                    &[
                        token("a1", user.id, TokenScope::Authentication),
                        token("r9", user.id, TokenScope::Refresh),
                    ],
                )
                .await,
            GatewayError::Conflict(_)
        );
        assert!(store.find_token("r1", TokenScope::Refresh).await.unwrap().is_some());
        assert!(store.find_token("r2", TokenScope::Refresh).await.unwrap().is_some());
        assert!(store.find_token("r9", TokenScope::Refresh).await.unwrap().is_none());

        assert_eq!(
            store
                .rotate_refresh_tokens("r1", user.id, &[token("r9", user.id, TokenScope::Refresh)])
                .await
                .unwrap(),
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_role_parent_must_exist() {
        let db = TestDatabase::new().await;
        assert_gateway_err!(
            db.store()
                .insert_role(NewRole {
                    name: "orphan".to_string(),
                    description: String::new(),
                    parent_id: Some(999),
                })
                .await,
            GatewayError::NotFound(_)
        );
    }

    #[tokio::test]
    async fn test_trusted_client_key_swap_and_cascade() {
        let db = TestDatabase::new().await;
        let store = db.store();

        let client = assert_ok!(
            store
                .insert_trusted_client(NewTrustedClient {
                    name: "svc".to_string(),
                    description: String::new(),
                    api_key_hash: "hash-one".to_string(),
                    rate_limit_rps: 2.5,
                    rate_limit_burst: 5,
                    enabled: true,
                })
                .await
        );
        assert_eq!(client.rate_limit_rps, 2.5);

        let swapped = assert_ok!(
            store
                .replace_trusted_client_key(client.id, client.version, "hash-two")
                .await
        );
        assert_eq!(swapped.version, client.version + 1);
        assert!(store.find_trusted_client_by_key_hash("hash-one").await.unwrap().is_none());
        assert!(store.find_trusted_client_by_key_hash("hash-two").await.unwrap().is_some());
        assert_gateway_err!(
            store
                .replace_trusted_client_key(client.id, client.version, "hash-three")
                .await,
            GatewayError::Conflict(_)
        );

        store
            .insert_trusted_client_log(TrustedClientLog {
                client_id: client.id,
                endpoint: "/v1/roles".to_string(),
                method: "GET".to_string(),
                status_code: 200,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        assert_ok!(store.delete_trusted_client(client.id).await);
        assert!(store.get_trusted_client(client.id).await.unwrap().is_none());
        assert_gateway_err!(store.delete_trusted_client(client.id).await, GatewayError::NotFound(_));
    }

    #[tokio::test]
    async fn test_created_at_comes_from_store_clock() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let db = TestDatabase::with_clock(clock.clone()).await;
        let store = db.store();

        let user = assert_ok!(store.insert_user(new_user("clock@example.com")).await);
        assert_eq!(user.created_at, start);

        let role = assert_ok!(
            store
                .insert_role(NewRole {
                    name: "auditor".to_string(),
                    description: String::new(),
                    parent_id: None,
                })
                .await
        );
        assert_eq!(role.created_at, start);

        clock.advance(Duration::days(3));
        let client = assert_ok!(
            store
                .insert_trusted_client(NewTrustedClient {
                    name: "svc".to_string(),
                    description: String::new(),
                    api_key_hash: "hash-clock".to_string(),
                    rate_limit_rps: 1.0,
                    rate_limit_burst: 1,
                    enabled: true,
                })
                .await
        );
        assert_eq!(client.created_at, start + Duration::days(3));

        let stored = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.created_at, start);
    }
}
