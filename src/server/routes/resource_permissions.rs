//! Resource-scoped grant endpoints

use crate::auth::ResourceRef;
use crate::auth::rbac::NewResourcePermission;
use crate::server::routes::{ApiResponse, ROLES_READ, ROLES_WRITE, require_permission};
use crate::server::state::AppState;
use crate::utils::error::Result;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/resource-permissions")
            .route("", web::post().to(grant))
            .route("", web::delete().to(revoke))
            .route("/{resource_type}/{resource_id}", web::get().to(list_for_resource)),
    );
}

#[derive(Debug, Deserialize)]
pub struct ResourceGrantRequest {
    pub user_id: i64,
    pub resource_type: String,
    pub resource_id: i64,
    pub permission: String,
}

impl ResourceGrantRequest {
    fn resource(&self) -> ResourceRef {
        ResourceRef::new(self.resource_type.clone(), self.resource_id)
    }
}

pub async fn grant(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ResourceGrantRequest>,
) -> Result<HttpResponse> {
    let ctx = require_permission(&req, &state, ROLES_WRITE, None).await?;
    let body = body.into_inner();
    let granted = state
        .auth
        .roles()
        .grant_resource_permission(NewResourcePermission {
            user_id: body.user_id,
            resource: body.resource(),
            permission: body.permission,
            granted_by: ctx.principal.id(),
        })
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(granted)))
}

pub async fn revoke(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ResourceGrantRequest>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_WRITE, None).await?;
    state
        .auth
        .roles()
        .revoke_resource_permission(body.user_id, &body.resource(), &body.permission)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_for_resource(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse> {
    require_permission(&req, &state, ROLES_READ, None).await?;
    let (resource_type, resource_id) = path.into_inner();
    let grants = state
        .auth
        .roles()
        .resource_permissions_for_resource(&ResourceRef::new(resource_type, resource_id))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(grants)))
}
