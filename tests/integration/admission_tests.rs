//! Admission controller behaviour under a manual clock

#[cfg(test)]
mod tests {
    use crate::common::Harness;
    use crate::common::fixtures::anonymous;
    use crate::{assert_allowed, assert_denied, assert_ok};
    use chrono::Duration;
    use greenlight::DenyReason;
    use greenlight::auth::trusted_client::UpdateTrustedClientRequest;
    use greenlight::config::RateLimitConfig;
    use greenlight::core::rate_limiter::{AdmissionKey, BucketParams};

    fn limits(rps: f64, burst: u32) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_second: rps,
            burst,
            ..RateLimitConfig::default()
        }
    }

    #[tokio::test]
    async fn test_bucket_refills_with_time() {
        let harness = Harness::memory_with(limits(2.0, 4));
        let limiter = harness.auth.limiter();

        for _ in 0..4 {
            assert!(limiter.admit_address("198.51.100.1"));
        }
        let denied = limiter.check_and_record(
            &AdmissionKey::Address("198.51.100.1".to_string()),
            limiter.default_params(),
        );
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_secs, Some(1));

        // Half a second at 2 rps buys exactly one token
        harness.clock.advance(Duration::milliseconds(500));
        assert!(limiter.admit_address("198.51.100.1"));
        assert!(!limiter.admit_address("198.51.100.1"));

        // Refill never exceeds the burst
        harness.clock.advance(Duration::hours(1));
        for _ in 0..4 {
            assert!(limiter.admit_address("198.51.100.1"));
        }
        assert!(!limiter.admit_address("198.51.100.1"));
    }

    #[tokio::test]
    async fn test_addresses_are_independent() {
        let harness = Harness::memory_with(limits(1.0, 1));
        let limiter = harness.auth.limiter();

        assert!(limiter.admit_address("198.51.100.1"));
        assert!(!limiter.admit_address("198.51.100.1"));
        assert!(limiter.admit_address("198.51.100.2"));
    }

    #[tokio::test]
    async fn test_idle_entries_are_evicted() {
        let harness = Harness::memory_with(RateLimitConfig {
            cleanup_interval: 180,
            ..RateLimitConfig::default()
        });
        let limiter = harness.auth.limiter();

        limiter.admit_address("198.51.100.1");
        harness.clock.advance(Duration::seconds(120));
        limiter.admit_address("198.51.100.2");

        harness.clock.advance(Duration::seconds(90));
        assert_eq!(limiter.cleanup(), 1);
        assert!(!limiter.contains(&AdmissionKey::Address("198.51.100.1".to_string())));
        assert!(limiter.contains(&AdmissionKey::Address("198.51.100.2".to_string())));
    }

    #[tokio::test]
    async fn test_evicted_key_starts_with_a_full_bucket() {
        let harness = Harness::memory_with(RateLimitConfig {
            requests_per_second: 1.0,
            burst: 2,
            cleanup_interval: 60,
            ..RateLimitConfig::default()
        });
        let limiter = harness.auth.limiter();

        assert!(limiter.admit_address("198.51.100.1"));
        assert!(limiter.admit_address("198.51.100.1"));
        assert!(!limiter.admit_address("198.51.100.1"));

        harness.clock.advance(Duration::seconds(61));
        assert_eq!(limiter.cleanup(), 1);
        assert!(limiter.admit_address("198.51.100.1"));
        assert!(limiter.admit_address("198.51.100.1"));
    }

    #[tokio::test]
    async fn test_disabled_limiter_keeps_no_state() {
        let harness = Harness::memory_with(RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        });
        let limiter = harness.auth.limiter();

        for _ in 0..100 {
            assert!(limiter.admit(&AdmissionKey::TrustedClient(1), BucketParams::new(1.0, 1)));
        }
        assert!(limiter.is_empty());
    }

    #[tokio::test]
    async fn test_trusted_client_quota_through_gate() {
        let harness = Harness::sqlite_with(limits(1.0, 1)).await;
        let client = harness.trusted_client("reporting", 3.0, 3).await;
        let gate = harness.auth.gate();
        let creds = anonymous("198.51.100.9").with_api_key(client.api_key.clone());

        for _ in 0..3 {
            let ctx = assert_allowed!(assert_ok!(gate.admit_request(&creds).await));
            assert_eq!(ctx.trusted_client.map(|c| c.id), Some(client.client.id));
        }
        assert_denied!(
            assert_ok!(gate.admit_request(&creds).await),
            DenyReason::RateLimited { .. }
        );

        // The address bucket was never touched
        assert!(harness.auth.limiter().admit_address("198.51.100.9"));
    }

    #[tokio::test]
    async fn test_quota_change_applies_on_next_request() {
        let harness = Harness::sqlite_with(limits(1.0, 1)).await;
        let client = harness.trusted_client("reporting", 1.0, 1).await;
        let gate = harness.auth.gate();
        let creds = anonymous("198.51.100.9").with_api_key(client.api_key.clone());

        assert_allowed!(gate.admit_request(&creds).await.unwrap());
        assert_denied!(gate.admit_request(&creds).await.unwrap(), DenyReason::RateLimited { .. });

        assert_ok!(
            harness
                .auth
                .clients()
                .update(
                    client.client.id,
                    UpdateTrustedClientRequest {
                        rate_limit_rps: Some(5.0),
                        rate_limit_burst: Some(5),
                        ..Default::default()
                    },
                )
                .await
        );

        for _ in 0..5 {
            assert_allowed!(gate.admit_request(&creds).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_disabled_client_falls_back_to_address() {
        let harness = Harness::sqlite_with(limits(1.0, 1)).await;
        let client = harness.trusted_client("reporting", 10.0, 10).await;
        harness
            .auth
            .clients()
            .set_enabled(client.client.id, false, None)
            .await
            .unwrap();

        let gate = harness.auth.gate();
        let creds = anonymous("198.51.100.9").with_api_key(client.api_key.clone());

        let ctx = assert_allowed!(gate.admit_request(&creds).await.unwrap());
        assert!(ctx.trusted_client.is_none());
        assert_denied!(gate.admit_request(&creds).await.unwrap(), DenyReason::RateLimited { .. });
    }
}
