use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Trusted client database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trusted_clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub name: String,

    pub description: String,

    /// Hex sha256 of the API key (unique)
    #[sea_orm(unique)]
    pub api_key_hash: String,

    /// Steady-state tokens per second
    pub rate_limit_rps: f64,

    /// Bucket capacity
    pub rate_limit_burst: i32,

    pub enabled: bool,

    pub created_at: DateTimeWithTimeZone,

    /// Optimistic concurrency counter
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Trusted client has many audit rows
    #[sea_orm(has_many = "super::trusted_client_log::Entity")]
    Logs,
}

impl Related<super::trusted_client_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Logs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
