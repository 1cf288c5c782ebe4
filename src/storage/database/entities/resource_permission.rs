use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Permission scoped to one resource instance.
/// Unique over (user_id, resource_type, resource_id, permission).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resource_permissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub user_id: i64,

    /// e.g. `movie`
    pub resource_type: String,

    pub resource_id: i64,

    /// Permission code
    pub permission: String,

    pub granted_by: Option<i64>,

    pub granted_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
