/// Permission entity module
pub mod permission;
/// Resource permission entity module
pub mod resource_permission;
/// Role entity module
pub mod role;
/// Role-permission edge entity module
pub mod role_permission;
/// Token entity module
pub mod token;
/// Trusted client entity module
pub mod trusted_client;
/// Trusted client audit log entity module
pub mod trusted_client_log;
/// User entity module
pub mod user;
/// User-role edge entity module
pub mod user_role;

pub use permission::Entity as Permission;
pub use resource_permission::Entity as ResourcePermission;
pub use role::Entity as Role;
pub use role_permission::Entity as RolePermission;
pub use token::Entity as Token;
pub use trusted_client::Entity as TrustedClient;
pub use trusted_client_log::Entity as TrustedClientLog;
pub use user::Entity as User;
pub use user_role::Entity as UserRole;
