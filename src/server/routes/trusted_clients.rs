//! Trusted client administration endpoints

use crate::auth::trusted_client::{CreateTrustedClientRequest, UpdateTrustedClientRequest};
use crate::server::routes::{ApiResponse, CLIENTS_WRITE, require_permission};
use crate::server::state::AppState;
use crate::utils::error::Result;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trusted-clients")
            .route("", web::get().to(list_clients))
            .route("", web::post().to(create_client))
            .route("/{id}", web::get().to(get_client))
            .route("/{id}", web::patch().to(update_client))
            .route("/{id}", web::delete().to(delete_client))
            .route("/{id}/regenerate-key", web::post().to(regenerate_key)),
    );
}

#[derive(Debug, Default, Deserialize)]
pub struct RegenerateKeyRequest {
    pub version: Option<i32>,
}

pub async fn list_clients(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    require_permission(&req, &state, CLIENTS_WRITE, None).await?;
    let clients = state.auth.clients().list().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(clients)))
}

/// The response is the only place the plaintext key ever appears
pub async fn create_client(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CreateTrustedClientRequest>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, CLIENTS_WRITE, None).await?;
    let created = state.auth.clients().create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(created)))
}

pub async fn get_client(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, CLIENTS_WRITE, None).await?;
    let client = state.auth.clients().get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(client)))
}

pub async fn update_client(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateTrustedClientRequest>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, CLIENTS_WRITE, None).await?;
    let client = state
        .auth
        .clients()
        .update(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(client)))
}

pub async fn delete_client(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, CLIENTS_WRITE, None).await?;
    state.auth.clients().delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn regenerate_key(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: Option<web::Json<RegenerateKeyRequest>>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, CLIENTS_WRITE, None).await?;
    let version = body.and_then(|b| b.into_inner().version);
    let rotated = state
        .auth
        .clients()
        .regenerate_key(path.into_inner(), version)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(rotated)))
}
