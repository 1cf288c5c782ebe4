use crate::auth::{NewUser, User};
use crate::utils::clock::Clock;
use crate::utils::error::{GatewayError, Result};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::debug;

use super::super::entities::{self, user};
use super::types::{SeaOrmStore, map_write_err};

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            created_at: model.created_at.with_timezone(&Utc),
            name: model.name,
            email: model.email,
            password_hash: model.password_hash,
            activated: model.activated,
            version: model.version,
        }
    }
}

impl SeaOrmStore {
    pub(super) async fn insert_user_row(&self, user: NewUser) -> Result<User> {
        debug!("Creating user: {}", user.email);

        let active_model = user::ActiveModel {
            created_at: Set(self.clock.now().into()),
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            activated: Set(user.activated),
            version: Set(1),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| map_write_err(e, "a user with this email address already exists"))?;
        Ok(model.into())
    }

    pub(super) async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let model = entities::User::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        Ok(model.map(User::from))
    }

    pub(super) async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        debug!("Finding user by email: {}", email);

        let model = entities::User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        Ok(model.map(User::from))
    }

    pub(super) async fn update_user_activation(
        &self,
        id: i64,
        activated: bool,
        expected_version: i32,
    ) -> Result<User> {
        let result = entities::User::update_many()
            .col_expr(user::Column::Activated, Expr::value(activated))
            .col_expr(user::Column::Version, Expr::col(user::Column::Version).add(1))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        if result.rows_affected == 0 {
            return Err(GatewayError::edit_conflict());
        }
        self.find_user_by_id(id)
            .await?
            .ok_or_else(GatewayError::edit_conflict)
    }
}
