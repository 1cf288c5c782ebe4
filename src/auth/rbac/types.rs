//! RBAC types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Permission codes held by a principal
pub type PermissionSet = HashSet<String>;

/// Named policy bundle with an optional single parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

/// Fields needed to insert a role
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewRole {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Partial role update. `parent_id: Some(None)` clears the parent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "double_option")]
    pub parent_id: Option<Option<i64>>,
    /// Version the caller last read
    pub version: Option<i32>,
}

/// Principal ↔ role edge with audit fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    pub user_id: i64,
    pub role_id: i64,
    pub granted_by: Option<i64>,
    pub granted_at: DateTime<Utc>,
}

/// A concrete object a permission can be scoped to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub resource_type: String,
    pub resource_id: i64,
}

impl ResourceRef {
    pub fn new<S: Into<String>>(resource_type: S, resource_id: i64) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id,
        }
    }
}

/// Permission granted on one resource instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePermission {
    pub id: i64,
    pub user_id: i64,
    pub resource_type: String,
    pub resource_id: i64,
    pub permission: String,
    pub granted_by: Option<i64>,
    pub granted_at: DateTime<Utc>,
}

impl ResourcePermission {
    pub fn resource(&self) -> ResourceRef {
        ResourceRef::new(self.resource_type.clone(), self.resource_id)
    }
}

/// Fields needed to insert a resource permission
#[derive(Debug, Clone, PartialEq)]
pub struct NewResourcePermission {
    pub user_id: i64,
    pub resource: ResourceRef,
    pub permission: String,
    pub granted_by: Option<i64>,
}

/// What a guarded operation demands of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRequirement {
    pub code: String,
    /// When set, a grant on this exact resource also satisfies the requirement
    pub resource: Option<ResourceRef>,
}

impl PermissionRequirement {
    pub fn global<S: Into<String>>(code: S) -> Self {
        Self {
            code: code.into(),
            resource: None,
        }
    }

    pub fn on_resource<S: Into<String>>(code: S, resource: ResourceRef) -> Self {
        Self {
            code: code.into(),
            resource: Some(resource),
        }
    }
}

/// Distinguishes an absent field from an explicit `null`
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
