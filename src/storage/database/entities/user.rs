use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// User ID
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Account creation timestamp
    pub created_at: DateTimeWithTimeZone,

    /// Display name
    pub name: String,

    /// Email address (unique)
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 password hash
    pub password_hash: String,

    /// Whether the account has been activated
    pub activated: bool,

    /// Optimistic concurrency counter
    pub version: i32,
}

/// User entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// User has many tokens
    #[sea_orm(has_many = "super::token::Entity")]
    Tokens,
}

impl Related<super::token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
