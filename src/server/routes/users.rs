//! Registration and activation endpoints

use crate::auth::User;
use crate::auth::token::IssuedToken;
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::utils::error::Result;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

// Plain resources rather than a scope: `/users/{id}/...` lives in the
// roles module and a `/users` scope would swallow it
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::post().to(register))
        .route("/users/activated", web::put().to(activate));
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: User,
    /// No email is sent; the caller forwards this token to the user
    pub activation_token: IssuedToken,
}

/// Create an inactive account and its activation token
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let (user, activation_token) = state
        .auth
        .register_user(&request.name, &request.email, &request.password)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(RegisterResponse {
        user,
        activation_token,
    })))
}

/// Consume an activation token
pub async fn activate(
    state: web::Data<AppState>,
    request: web::Json<ActivateRequest>,
) -> Result<HttpResponse> {
    let user = state.auth.tokens().activate(&request.token).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}
