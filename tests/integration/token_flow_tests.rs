//! Token issuance, rotation, expiry and activation over SQLite

#[cfg(test)]
mod tests {
    use crate::common::Harness;
    use crate::common::fixtures::PASSWORD;
    use crate::{assert_gateway_err, assert_ok};
    use chrono::Duration;
    use greenlight::GatewayError;
    use greenlight::auth::TokenScope;
    use greenlight::utils::auth::hash_secret;

    #[tokio::test]
    async fn test_login_pair_authenticates() {
        let harness = Harness::sqlite().await;
        let (user, pair) = harness.logged_in("alice@example.com").await;

        assert_eq!(pair.access.plaintext.len(), 26);
        assert_eq!(pair.refresh.plaintext.len(), 26);
        assert_ne!(pair.access.plaintext, pair.refresh.plaintext);

        let authenticated = assert_ok!(harness.auth.tokens().authenticate(&pair.access.plaintext).await);
        assert_eq!(authenticated.id, user.id);

        // Only the hash is stored, and only under its own scope
        let stored = harness
            .store
            .find_token(&hash_secret(&pair.access.plaintext), TokenScope::Authentication)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.user_id, user.id);
        assert!(!stored.is_refresh);
        assert!(
            harness
                .store
                .find_token(&hash_secret(&pair.access.plaintext), TokenScope::Refresh)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_authenticate() {
        let harness = Harness::sqlite().await;
        let (_, pair) = harness.logged_in("bob@example.com").await;

        assert_gateway_err!(
            harness.auth.tokens().authenticate(&pair.refresh.plaintext).await,
            GatewayError::InvalidToken
        );
    }

    #[tokio::test]
    async fn test_rotation_is_single_use() {
        let harness = Harness::sqlite().await;
        let (user, pair) = harness.logged_in("carol@example.com").await;
        let tokens = harness.auth.tokens();

        let rotated = assert_ok!(tokens.rotate_refresh(&pair.refresh.plaintext).await);
        assert_ne!(rotated.refresh.plaintext, pair.refresh.plaintext);

        let again = tokens.authenticate(&rotated.access.plaintext).await.unwrap();
        assert_eq!(again.id, user.id);

        assert_gateway_err!(
            tokens.rotate_refresh(&pair.refresh.plaintext).await,
            GatewayError::InvalidToken
        );
        // The fresh refresh token still works exactly once
        assert_ok!(tokens.rotate_refresh(&rotated.refresh.plaintext).await);
    }

    #[tokio::test]
    async fn test_concurrent_rotation_has_one_winner() {
        let harness = Harness::sqlite().await;
        let (_, pair) = harness.logged_in("dave@example.com").await;
        let tokens = harness.auth.tokens();

        let (a, b) = tokio::join!(
            tokens.rotate_refresh(&pair.refresh.plaintext),
            tokens.rotate_refresh(&pair.refresh.plaintext)
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    }

    #[tokio::test]
    async fn test_expiry_follows_the_clock() {
        let harness = Harness::sqlite().await;
        let (_, pair) = harness.logged_in("erin@example.com").await;
        let tokens = harness.auth.tokens();

        harness.clock.advance(Duration::minutes(15) + Duration::seconds(1));
        assert_gateway_err!(
            tokens.authenticate(&pair.access.plaintext).await,
            GatewayError::InvalidToken
        );

        // Refresh is good for a day
        let rotated = assert_ok!(tokens.rotate_refresh(&pair.refresh.plaintext).await);

        harness.clock.advance(Duration::days(2));
        assert_gateway_err!(
            tokens.rotate_refresh(&rotated.refresh.plaintext).await,
            GatewayError::ExpiredToken
        );
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired_rows() {
        let harness = Harness::sqlite().await;
        let (_, old) = harness.logged_in("frank@example.com").await;
        let tokens = harness.auth.tokens();

        harness.clock.advance(Duration::minutes(20));
        let fresh = tokens.rotate_refresh(&old.refresh.plaintext).await.unwrap();

        // The old access token is the only expired row
        let purged = assert_ok!(tokens.purge_expired().await);
        assert_eq!(purged, 1);
        assert_ok!(tokens.authenticate(&fresh.access.plaintext).await);
    }

    #[tokio::test]
    async fn test_logout_revokes_every_token() {
        let harness = Harness::sqlite().await;
        let (user, pair) = harness.logged_in("grace@example.com").await;
        let tokens = harness.auth.tokens();

        assert_eq!(tokens.revoke_all(user.id, TokenScope::Authentication).await.unwrap(), 1);
        assert_eq!(tokens.revoke_all(user.id, TokenScope::Refresh).await.unwrap(), 1);

        assert_gateway_err!(tokens.authenticate(&pair.access.plaintext).await, GatewayError::InvalidToken);
        assert_gateway_err!(tokens.rotate_refresh(&pair.refresh.plaintext).await, GatewayError::InvalidToken);
    }

    #[tokio::test]
    async fn test_registration_then_activation() {
        let harness = Harness::sqlite().await;
        let (user, activation) = assert_ok!(
            harness
                .auth
                .register_user("Heidi", "heidi@example.com", PASSWORD)
                .await
        );
        assert!(!user.activated);

        assert_gateway_err!(
            harness.auth.tokens().login("heidi@example.com", PASSWORD).await,
            GatewayError::InactiveAccount
        );

        let activated = assert_ok!(harness.auth.tokens().activate(&activation.plaintext).await);
        assert!(activated.activated);
        assert_eq!(activated.version, user.version + 1);

        assert_gateway_err!(
            harness.auth.tokens().activate(&activation.plaintext).await,
            GatewayError::InvalidToken
        );
        assert_ok!(harness.auth.tokens().login("heidi@example.com", PASSWORD).await);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let harness = Harness::sqlite().await;
        harness.user("ivan@example.com", true).await;

        assert_gateway_err!(
            harness
                .auth
                .register_user("Ivan", "ivan@example.com", PASSWORD)
                .await,
            GatewayError::Conflict(_)
        );
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_alike() {
        let harness = Harness::sqlite().await;
        harness.user("judy@example.com", true).await;

        assert_gateway_err!(
            harness.auth.tokens().login("judy@example.com", "not-the-password").await,
            GatewayError::InvalidCredentials
        );
        assert_gateway_err!(
            harness.auth.tokens().login("nobody@example.com", PASSWORD).await,
            GatewayError::InvalidCredentials
        );
    }
}
