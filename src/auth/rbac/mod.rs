//! Role-Based Access Control (RBAC) system
//!
//! Roles form a single-parent tree. A user's effective permissions are the
//! union of the grants on every assigned role and all of its ancestors.
//! Resource-scoped grants are an alternative path to the same permission
//! on one object.

mod manager;
mod resolver;
mod types;

pub use manager::RoleManager;
pub use resolver::PermissionResolver;
pub use types::{
    NewResourcePermission, NewRole, PermissionRequirement, PermissionSet, ResourcePermission,
    ResourceRef, Role, RoleUpdate, UserRoleAssignment,
};
