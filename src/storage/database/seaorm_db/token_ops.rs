use crate::auth::token::{TokenRecord, TokenScope};
use crate::utils::error::{GatewayError, Result};
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::*;
use tracing::debug;

use super::super::entities::{self, token};
use super::types::{SeaOrmStore, map_write_err};

impl TryFrom<token::Model> for TokenRecord {
    type Error = GatewayError;

    fn try_from(model: token::Model) -> Result<Self> {
        let scope = model.scope.parse::<TokenScope>().map_err(GatewayError::Storage)?;
        Ok(Self {
            hash: model.hash,
            user_id: model.user_id,
            expiry: model.expiry.with_timezone(&Utc),
            scope,
            is_refresh: model.is_refresh,
        })
    }
}

async fn insert_rows<C: ConnectionTrait>(conn: &C, tokens: &[TokenRecord]) -> Result<()> {
    if tokens.is_empty() {
        return Ok(());
    }

    let models = tokens.iter().map(|t| token::ActiveModel {
        hash: Set(t.hash.clone()),
        user_id: Set(t.user_id),
        expiry: Set(t.expiry.into()),
        scope: Set(t.scope.as_str().to_string()),
        is_refresh: Set(t.is_refresh),
    });

    // A multi-row insert is a single statement, so either every row lands or none do
    entities::Token::insert_many(models)
        .exec_without_returning(conn)
        .await
        .map_err(|e| map_write_err(e, "duplicate token hash"))?;
    Ok(())
}

impl SeaOrmStore {
    pub(super) async fn insert_token_rows(&self, tokens: &[TokenRecord]) -> Result<()> {
        insert_rows(&self.db, tokens).await
    }

    /// Single-winner rotation: the delete of `old_hash` decides who proceeds,
    /// and the replacement lands in the same transaction or not at all
    pub(super) async fn rotate_refresh_token_rows(
        &self,
        old_hash: &str,
        user_id: i64,
        replacement: &[TokenRecord],
    ) -> Result<Option<u64>> {
        let txn = self.db.begin().await.map_err(GatewayError::Database)?;

        let consumed = entities::Token::delete_many()
            .filter(token::Column::Hash.eq(old_hash))
            .filter(token::Column::Scope.eq(TokenScope::Refresh.as_str()))
            .exec(&txn)
            .await
            .map_err(GatewayError::Database)?;
        if consumed.rows_affected == 0 {
            txn.rollback().await.map_err(GatewayError::Database)?;
            return Ok(None);
        }

        let others = entities::Token::delete_many()
            .filter(token::Column::UserId.eq(user_id))
            .filter(token::Column::Scope.eq(TokenScope::Refresh.as_str()))
            .exec(&txn)
            .await
            .map_err(GatewayError::Database)?;

        insert_rows(&txn, replacement).await?;
        txn.commit().await.map_err(GatewayError::Database)?;

        let revoked = consumed.rows_affected + others.rows_affected;
        debug!("Rotated refresh tokens for user {}, {} revoked", user_id, revoked);
        Ok(Some(revoked))
    }

    pub(super) async fn find_token_row(
        &self,
        hash: &str,
        scope: TokenScope,
    ) -> Result<Option<TokenRecord>> {
        entities::Token::find_by_id(hash.to_string())
            .filter(token::Column::Scope.eq(scope.as_str()))
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)?
            .map(TokenRecord::try_from)
            .transpose()
    }

    pub(super) async fn delete_token_rows_for_user(
        &self,
        user_id: i64,
        scope: TokenScope,
    ) -> Result<u64> {
        let result = entities::Token::delete_many()
            .filter(token::Column::UserId.eq(user_id))
            .filter(token::Column::Scope.eq(scope.as_str()))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        debug!(
            "Deleted {} {} tokens for user {}",
            result.rows_affected, scope, user_id
        );
        Ok(result.rows_affected)
    }

    pub(super) async fn delete_expired_token_rows(&self, now: DateTime<Utc>) -> Result<u64> {
        let now: DateTimeWithTimeZone = now.into();
        let result = entities::Token::delete_many()
            .filter(token::Column::Expiry.lte(now))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        Ok(result.rows_affected)
    }
}
