//! HTTP route modules
//!
//! Every route except `/health` sits behind the admission middleware, so
//! handlers can read the caller's [`AuthContext`] from the request. Handlers
//! that guard an operation call [`require_permission`] first.

pub mod health;
pub mod resource_permissions;
pub mod roles;
pub mod tokens;
pub mod trusted_clients;
pub mod users;

use crate::auth::{AuthContext, PermissionRequirement, ResourceRef};
use crate::server::middleware::request_context;
use crate::server::state::AppState;
use crate::utils::error::Result;
use actix_web::{HttpRequest, web};

/// Role and resource-grant administration
pub const ROLES_WRITE: &str = "roles:write";
/// Reading roles, assignments and grants
pub const ROLES_READ: &str = "roles:read";
/// Trusted client administration
pub const CLIENTS_WRITE: &str = "clients:write";

/// Standard API response structure
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T>
where
    T: serde::Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

/// Run the gate's permission step for the current request
pub async fn require_permission(
    req: &HttpRequest,
    state: &AppState,
    code: &str,
    resource: Option<ResourceRef>,
) -> Result<AuthContext> {
    let ctx = request_context(req)?;
    let requirement = PermissionRequirement {
        code: code.to_string(),
        resource,
    };
    state
        .auth
        .gate()
        .check_requirement(ctx, &requirement)
        .await?
        .into_result()
}

/// Mount every versioned route
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .configure(tokens::configure_routes)
            .configure(users::configure_routes)
            .configure(roles::configure_routes)
            .configure(resource_permissions::configure_routes)
            .configure(trusted_clients::configure_routes),
    );
}
