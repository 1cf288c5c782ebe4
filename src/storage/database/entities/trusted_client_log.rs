use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One audited request made by a trusted client
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trusted_client_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub client_id: i64,

    /// Request path
    pub endpoint: String,

    /// HTTP method
    pub method: String,

    /// Response status
    pub status_code: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::trusted_client::Entity",
        from = "Column::ClientId",
        to = "super::trusted_client::Column::Id",
        on_delete = "Cascade"
    )]
    TrustedClient,
}

impl Related<super::trusted_client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrustedClient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
