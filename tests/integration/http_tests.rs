//! HTTP surface tests against the full application

#[cfg(test)]
mod tests {
    use crate::common::Harness;
    use crate::common::fixtures::PASSWORD;
    use actix_web::body::MessageBody;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{test, web};
    use greenlight::config::RateLimitConfig;
    use greenlight::server::{AppState, HttpServer};
    use serde_json::{Value, json};

    macro_rules! app {
        ($harness:expr) => {
            test::init_service(HttpServer::create_app(web::Data::new(AppState::new(
                $harness.config(),
                $harness.auth.clone(),
            ))))
            .await
        };
    }

    /// Test requests share one address, so multi-step flows need headroom
    fn roomy() -> Harness {
        Harness::memory_with(RateLimitConfig {
            requests_per_second: 100.0,
            burst: 100,
            ..RateLimitConfig::default()
        })
    }

    async fn read_json<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
        test::read_body_json(resp).await
    }

    #[actix_web::test]
    async fn test_health_is_public() {
        let harness = Harness::memory();
        let app = app!(harness);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("Server").unwrap(), "greenlight-rs");

        let body = read_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");
    }

    #[actix_web::test]
    async fn test_register_activate_login_refresh_logout() {
        let harness = roomy();
        let app = app!(harness);

        let req = test::TestRequest::post()
            .uri("/v1/users")
            .set_json(json!({"name": "Alice", "email": "alice@example.com", "password": PASSWORD}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["user"]["activated"], false);
        assert!(body["data"]["user"].get("password_hash").is_none());
        let activation = body["data"]["activation_token"]["token"].as_str().unwrap().to_string();

        let login = json!({"email": "alice@example.com", "password": PASSWORD});
        let req = test::TestRequest::post()
            .uri("/v1/tokens/authentication")
            .set_json(&login)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri("/v1/users/activated")
            .set_json(json!({"token": activation}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_json(resp).await["data"]["activated"], true);

        let req = test::TestRequest::post()
            .uri("/v1/tokens/authentication")
            .set_json(&login)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let pair = read_json(resp).await["data"].clone();
        let refresh = pair["refresh_token"]["token"].as_str().unwrap().to_string();
        assert_eq!(refresh.len(), 26);

        let req = test::TestRequest::post()
            .uri("/v1/tokens/refresh")
            .set_json(json!({"refresh_token": refresh}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let access = read_json(resp).await["data"]["authentication_token"]["token"]
            .as_str()
            .unwrap()
            .to_string();

        // The rotated refresh token is spent
        let req = test::TestRequest::post()
            .uri("/v1/tokens/refresh")
            .set_json(json!({"refresh_token": refresh}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::delete()
            .uri("/v1/tokens/authentication")
            .insert_header(("Authorization", format!("Bearer {access}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_json(resp).await["data"]["revoked"], 3);

        let req = test::TestRequest::delete()
            .uri("/v1/tokens/authentication")
            .insert_header(("Authorization", format!("Bearer {access}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(resp).await["error"]["code"], "INVALID_TOKEN");
    }

    #[actix_web::test]
    async fn test_role_administration_requires_permission() {
        let harness = roomy();
        let admin_role = harness.role("admin", None, &["roles:read", "roles:write"]).await;
        let (admin, admin_pair) = harness.logged_in("admin@example.com").await;
        harness.auth.roles().assign_role(admin.id, admin_role.id, None).await.unwrap();
        let (member, member_pair) = harness.logged_in("member@example.com").await;
        let app = app!(harness);

        let new_role = json!({"name": "viewer", "description": "read only"});

        let req = test::TestRequest::post().uri("/v1/roles").set_json(&new_role).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(resp).await["error"]["code"], "AUTH_REQUIRED");

        let req = test::TestRequest::post()
            .uri("/v1/roles")
            .insert_header(("Authorization", format!("Bearer {}", member_pair.access.plaintext)))
            .set_json(&new_role)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(read_json(resp).await["error"]["code"], "NOT_PERMITTED");

        let admin_auth = ("Authorization", format!("Bearer {}", admin_pair.access.plaintext));

        let req = test::TestRequest::post()
            .uri("/v1/roles")
            .insert_header(admin_auth.clone())
            .set_json(&new_role)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let viewer_id = read_json(resp).await["data"]["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/v1/roles/{viewer_id}/permissions"))
            .insert_header(admin_auth.clone())
            .set_json(json!({"permission": "movies:read"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/v1/roles/assign")
            .insert_header(admin_auth.clone())
            .set_json(json!({"user_id": member.id, "role_id": viewer_id}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(read_json(resp).await["data"]["granted_by"], admin.id);

        let req = test::TestRequest::get()
            .uri(&format!("/v1/users/{}/permissions", member.id))
            .insert_header(admin_auth.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_json(resp).await["data"]["permissions"], json!(["movies:read"]));

        // Making a role its own parent is refused
        let req = test::TestRequest::patch()
            .uri(&format!("/v1/roles/{viewer_id}"))
            .insert_header(admin_auth.clone())
            .set_json(json!({"parent_id": viewer_id}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let req = test::TestRequest::get()
            .uri("/v1/roles/9999")
            .insert_header(admin_auth)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_trusted_client_key_is_returned_once_and_admits() {
        let harness = roomy();
        let ops = harness.role("ops", None, &["clients:write"]).await;
        let (admin, pair) = harness.logged_in("ops@example.com").await;
        harness.auth.roles().assign_role(admin.id, ops.id, None).await.unwrap();
        let app = app!(harness);
        let auth = ("Authorization", format!("Bearer {}", pair.access.plaintext));

        let req = test::TestRequest::post()
            .uri("/v1/trusted-clients")
            .insert_header(auth.clone())
            .set_json(json!({"name": "billing", "rate_limit_rps": 1.0, "rate_limit_burst": 1}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = read_json(resp).await;
        let id = body["data"]["client"]["id"].as_i64().unwrap();
        let key = body["data"]["api_key"].as_str().unwrap().to_string();
        assert!(body["data"]["client"].get("api_key_hash").is_none());

        let req = test::TestRequest::get()
            .uri(&format!("/v1/trusted-clients/{id}"))
            .insert_header(auth.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(read_json(resp).await["data"].get("api_key").is_none());

        // Burst of one under the client's own quota
        let req = test::TestRequest::get()
            .uri("/v1/roles")
            .insert_header(("X-API-Key", key.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
        let req = test::TestRequest::get()
            .uri("/v1/roles")
            .insert_header(("X-API-Key", key.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get("Retry-After").unwrap(), "1");

        let req = test::TestRequest::post()
            .uri(&format!("/v1/trusted-clients/{id}/regenerate-key"))
            .insert_header(auth)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let rotated = read_json(resp).await["data"]["api_key"].as_str().unwrap().to_string();
        assert_ne!(rotated, key);
        assert!(harness.auth.clients().verify_key(&key).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_anonymous_burst_is_rate_limited() {
        let harness = Harness::memory_with(RateLimitConfig {
            requests_per_second: 1.0,
            burst: 2,
            ..RateLimitConfig::default()
        });
        let app = app!(harness);

        let login = json!({"email": "nobody@example.com", "password": PASSWORD});
        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/v1/tokens/authentication")
                .set_json(&login)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
        }

        let req = test::TestRequest::post()
            .uri("/v1/tokens/authentication")
            .set_json(&login)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(read_json(resp).await["error"]["code"], "RATE_LIMIT_EXCEEDED");
    }
}
