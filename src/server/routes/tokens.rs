//! Token endpoints: login, refresh rotation and logout

use crate::auth::TokenScope;
use crate::server::middleware::request_context;
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::info;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tokens")
            .route("/authentication", web::post().to(login))
            .route("/authentication", web::delete().to(logout))
            .route("/refresh", web::post().to(refresh)),
    );
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: u64,
}

/// Exchange email and password for an access/refresh pair
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let (user, pair) = state
        .auth
        .tokens()
        .login(&request.email, &request.password)
        .await?;

    info!(user_id = user.id, "user logged in");
    Ok(HttpResponse::Created().json(ApiResponse::success(pair)))
}

/// Rotate a refresh token into a fresh pair
pub async fn refresh(
    state: web::Data<AppState>,
    request: web::Json<RefreshRequest>,
) -> Result<HttpResponse> {
    let pair = state
        .auth
        .tokens()
        .rotate_refresh(&request.refresh_token)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(pair)))
}

/// Revoke every access and refresh token the caller holds
pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let ctx = request_context(&req)?;
    let user_id = ctx.principal.id().ok_or(GatewayError::Unauthenticated)?;

    let tokens = state.auth.tokens();
    let revoked = tokens.revoke_all(user_id, TokenScope::Authentication).await?
        + tokens.revoke_all(user_id, TokenScope::Refresh).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(LogoutResponse { revoked })))
}
