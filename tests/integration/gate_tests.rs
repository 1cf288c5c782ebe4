//! End-to-end gate decisions over SQLite

#[cfg(test)]
mod tests {
    use crate::common::Harness;
    use crate::common::fixtures::{anonymous, bearer};
    use crate::{assert_allowed, assert_denied, assert_ok};
    use chrono::Duration;
    use greenlight::DenyReason;
    use greenlight::auth::rbac::NewResourcePermission;
    use greenlight::auth::{PermissionRequirement, ResourceRef};
    use greenlight::config::RateLimitConfig;

    const ADDR: &str = "192.0.2.10";

    #[tokio::test]
    async fn test_movie_catalogue_scenario() {
        let harness = Harness::sqlite().await;
        let viewer = harness.role("viewer", None, &["movies:read"]).await;
        harness.role("editor", Some(&viewer), &["movies:write"]).await;

        let (reader, reader_pair) = harness.logged_in("reader@example.com").await;
        harness.auth.roles().assign_role(reader.id, viewer.id, None).await.unwrap();

        let gate = harness.auth.gate();
        let read = PermissionRequirement::global("movies:read");
        let write = PermissionRequirement::on_resource("movies:write", ResourceRef::new("movie", 42));

        let ctx = assert_allowed!(assert_ok!(
            gate.authorize(&bearer(ADDR, &reader_pair), Some(&read)).await
        ));
        assert_eq!(ctx.principal.id(), Some(reader.id));

        assert_denied!(
            assert_ok!(gate.authorize(&bearer(ADDR, &reader_pair), Some(&write)).await),
            DenyReason::Forbidden
        );

        // A grant on movie 42 alone lets the reader edit it
        harness
            .auth
            .roles()
            .grant_resource_permission(NewResourcePermission {
                user_id: reader.id,
                resource: ResourceRef::new("movie", 42),
                permission: "movies:write".to_string(),
                granted_by: None,
            })
            .await
            .unwrap();
        assert_allowed!(assert_ok!(
            gate.authorize(&bearer(ADDR, &reader_pair), Some(&write)).await
        ));
    }

    #[tokio::test]
    async fn test_anonymous_needs_authentication_for_guarded_operations() {
        let harness = Harness::sqlite().await;
        let gate = harness.auth.gate();

        assert_allowed!(gate.authorize(&anonymous(ADDR), None).await.unwrap());
        assert_denied!(
            gate.authorize(&anonymous(ADDR), Some(&PermissionRequirement::global("movies:read")))
                .await
                .unwrap(),
            DenyReason::AuthenticationRequired
        );
    }

    #[tokio::test]
    async fn test_inactive_user_is_denied_before_permission_lookup() {
        let harness = Harness::sqlite().await;
        let role = harness.role("viewer", None, &["movies:read"]).await;
        let user = harness.user("pending@example.com", false).await;
        harness.auth.roles().assign_role(user.id, role.id, None).await.unwrap();

        // Inactive users cannot log in, so issue directly
        let pair = harness.auth.tokens().issue_pair(user.id).await.unwrap();
        assert_denied!(
            harness
                .auth
                .gate()
                .authorize(&bearer(ADDR, &pair), Some(&PermissionRequirement::global("movies:read")))
                .await
                .unwrap(),
            DenyReason::InactiveAccount
        );
    }

    #[tokio::test]
    async fn test_expired_and_garbage_tokens() {
        let harness = Harness::sqlite().await;
        let (_, pair) = harness.logged_in("erin@example.com").await;
        let gate = harness.auth.gate();

        let garbage = anonymous(ADDR).with_bearer("not-a-token");
        assert_denied!(gate.admit_request(&garbage).await.unwrap(), DenyReason::InvalidCredential);

        let mut wrong_scheme = anonymous(ADDR);
        wrong_scheme.authorization = Some(format!("Token {}", pair.access.plaintext));
        assert_denied!(
            gate.admit_request(&wrong_scheme).await.unwrap(),
            DenyReason::InvalidCredential
        );

        harness.clock.advance(Duration::hours(1));
        assert_denied!(
            gate.admit_request(&bearer(ADDR, &pair)).await.unwrap(),
            DenyReason::InvalidCredential
        );

        // Denied credentials never reach the limiter
        assert!(harness.auth.limiter().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_precedes_permission_check() {
        let harness = Harness::sqlite_with(RateLimitConfig {
            requests_per_second: 1.0,
            burst: 1,
            ..RateLimitConfig::default()
        })
        .await;
        let (_, pair) = harness.logged_in("frank@example.com").await;
        let gate = harness.auth.gate();
        let requirement = PermissionRequirement::global("movies:read");

        assert_denied!(
            gate.authorize(&bearer(ADDR, &pair), Some(&requirement)).await.unwrap(),
            DenyReason::Forbidden
        );
        assert_denied!(
            gate.authorize(&bearer(ADDR, &pair), Some(&requirement)).await.unwrap(),
            DenyReason::RateLimited { retry_after: Some(1) }
        );
    }
}
