//! Role administration endpoints

use crate::auth::rbac::{NewRole, RoleUpdate};
use crate::server::routes::{ApiResponse, ROLES_READ, ROLES_WRITE, require_permission};
use crate::server::state::AppState;
use crate::utils::error::Result;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Literal segments first so they are not captured by `{id}`
    cfg.service(
        web::scope("/roles")
            .route("", web::get().to(list_roles))
            .route("", web::post().to(create_role))
            .route("/assign", web::post().to(assign_role))
            .route("/unassign", web::post().to(unassign_role))
            .route("/{id}", web::get().to(get_role))
            .route("/{id}", web::patch().to(update_role))
            .route("/{id}", web::delete().to(delete_role))
            .route("/{id}/permissions", web::get().to(list_role_permissions))
            .route("/{id}/permissions", web::post().to(grant_role_permission))
            .route("/{id}/permissions", web::delete().to(revoke_role_permission)),
    )
    .route("/users/{id}/roles", web::get().to(user_roles))
    .route("/users/{id}/permissions", web::get().to(user_permissions));
}

#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    pub user_id: i64,
    pub role_id: i64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PermissionCodeRequest {
    pub permission: String,
}

#[derive(Debug, Serialize)]
pub struct PermissionList {
    pub permissions: Vec<String>,
}

pub async fn list_roles(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_READ, None).await?;
    let roles = state.auth.roles().list_roles().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(roles)))
}

pub async fn create_role(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NewRole>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_WRITE, None).await?;
    let role = state.auth.roles().create_role(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(role)))
}

pub async fn get_role(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_READ, None).await?;
    let role = state.auth.roles().get_role(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(role)))
}

pub async fn update_role(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<RoleUpdate>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_WRITE, None).await?;
    let role = state
        .auth
        .roles()
        .update_role(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(role)))
}

pub async fn delete_role(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_WRITE, None).await?;
    state.auth.roles().delete_role(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn assign_role(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<AssignmentRequest>,
) -> Result<HttpResponse> {
    let ctx = require_permission(&req, &state, ROLES_WRITE, None).await?;
    let assignment = state
        .auth
        .roles()
        .assign_role(body.user_id, body.role_id, ctx.principal.id())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(assignment)))
}

pub async fn unassign_role(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<AssignmentRequest>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_WRITE, None).await?;
    state
        .auth
        .roles()
        .unassign_role(body.user_id, body.role_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_role_permissions(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_READ, None).await?;
    let permissions = state.auth.roles().role_permissions(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(PermissionList { permissions })))
}

pub async fn grant_role_permission(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<PermissionCodeRequest>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_WRITE, None).await?;
    let role_id = path.into_inner();
    state
        .auth
        .roles()
        .grant_permission(role_id, &body.permission)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(body.into_inner())))
}

pub async fn revoke_role_permission(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<PermissionCodeRequest>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_WRITE, None).await?;
    state
        .auth
        .roles()
        .revoke_permission(path.into_inner(), &body.permission)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn user_roles(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_READ, None).await?;
    let roles = state.auth.roles().roles_for_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(roles)))
}

/// Effective permission codes, inherited ones included
pub async fn user_permissions(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_READ, None).await?;
    let set = state
        .auth
        .permissions()
        .effective_permissions(path.into_inner())
        .await?;
    let mut permissions: Vec<String> = set.iter().cloned().collect();
    permissions.sort();
    Ok(HttpResponse::Ok().json(ApiResponse::success(PermissionList { permissions })))
}
