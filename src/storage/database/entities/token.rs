use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bearer token database model. Only the hash of the plaintext is stored.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tokens")]
pub struct Model {
    /// Hex sha256 of the token plaintext
    #[sea_orm(primary_key, auto_increment = false)]
    pub hash: String,

    /// Owning user
    pub user_id: i64,

    /// Instant after which the token is unusable
    pub expiry: DateTimeWithTimeZone,

    /// authentication, refresh or activation
    pub scope: String,

    /// Set on the refresh half of a pair
    pub is_refresh: bool,
}

/// Token entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Belongs to user relation
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
