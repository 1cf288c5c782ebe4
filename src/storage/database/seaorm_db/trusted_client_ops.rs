use crate::auth::trusted_client::{NewTrustedClient, TrustedClient, TrustedClientLog};
use crate::utils::clock::Clock;
use crate::utils::error::{GatewayError, Result};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::debug;

use super::super::entities::{self, trusted_client, trusted_client_log};
use super::types::{SeaOrmStore, map_write_err};

const DUPLICATE_KEY: &str = "API key hash already in use";

impl TryFrom<trusted_client::Model> for TrustedClient {
    type Error = GatewayError;

    /// A negative stored burst is corrupt data, not an empty bucket
    fn try_from(model: trusted_client::Model) -> Result<Self> {
        let rate_limit_burst = u32::try_from(model.rate_limit_burst).map_err(|_| {
            GatewayError::storage(format!(
                "trusted client {} has invalid rate_limit_burst {}",
                model.id, model.rate_limit_burst
            ))
        })?;
        Ok(Self {
            id: model.id,
            name: model.name,
            description: model.description,
            api_key_hash: model.api_key_hash,
            rate_limit_rps: model.rate_limit_rps,
            rate_limit_burst,
            enabled: model.enabled,
            created_at: model.created_at.with_timezone(&Utc),
            version: model.version,
        })
    }
}

fn burst_column(burst: u32) -> Result<i32> {
    i32::try_from(burst).map_err(|_| GatewayError::validation("rate_limit_burst is too large"))
}

impl SeaOrmStore {
    pub(super) async fn insert_trusted_client_row(
        &self,
        client: NewTrustedClient,
    ) -> Result<TrustedClient> {
        debug!("Creating trusted client: {}", client.name);

        let active_model = trusted_client::ActiveModel {
            name: Set(client.name),
            description: Set(client.description),
            api_key_hash: Set(client.api_key_hash),
            rate_limit_rps: Set(client.rate_limit_rps),
            rate_limit_burst: Set(burst_column(client.rate_limit_burst)?),
            enabled: Set(client.enabled),
            created_at: Set(self.clock.now().into()),
            version: Set(1),
            ..Default::default()
        };
        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| map_write_err(e, DUPLICATE_KEY))?;
        TrustedClient::try_from(model)
    }

    pub(super) async fn find_trusted_client_by_id(&self, id: i64) -> Result<Option<TrustedClient>> {
        let model = entities::TrustedClient::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        model.map(TrustedClient::try_from).transpose()
    }

    pub(super) async fn find_trusted_client_row_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<TrustedClient>> {
        let model = entities::TrustedClient::find()
            .filter(trusted_client::Column::ApiKeyHash.eq(hash))
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        model.map(TrustedClient::try_from).transpose()
    }

    pub(super) async fn list_trusted_client_rows(&self) -> Result<Vec<TrustedClient>> {
        let models = entities::TrustedClient::find()
            .order_by_asc(trusted_client::Column::Id)
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        models.into_iter().map(TrustedClient::try_from).collect()
    }

    pub(super) async fn update_trusted_client_row(
        &self,
        client: &TrustedClient,
    ) -> Result<TrustedClient> {
        let result = entities::TrustedClient::update_many()
            .col_expr(trusted_client::Column::Name, Expr::value(client.name.clone()))
            .col_expr(
                trusted_client::Column::Description,
                Expr::value(client.description.clone()),
            )
            .col_expr(
                trusted_client::Column::RateLimitRps,
                Expr::value(client.rate_limit_rps),
            )
            .col_expr(
                trusted_client::Column::RateLimitBurst,
                Expr::value(burst_column(client.rate_limit_burst)?),
            )
            .col_expr(trusted_client::Column::Enabled, Expr::value(client.enabled))
            .col_expr(
                trusted_client::Column::Version,
                Expr::col(trusted_client::Column::Version).add(1),
            )
            .filter(trusted_client::Column::Id.eq(client.id))
            .filter(trusted_client::Column::Version.eq(client.version))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        if result.rows_affected == 0 {
            return Err(GatewayError::edit_conflict());
        }
        self.find_trusted_client_by_id(client.id)
            .await?
            .ok_or_else(GatewayError::edit_conflict)
    }

    pub(super) async fn replace_trusted_client_key_hash(
        &self,
        id: i64,
        expected_version: i32,
        new_hash: &str,
    ) -> Result<TrustedClient> {
        let result = entities::TrustedClient::update_many()
            .col_expr(
                trusted_client::Column::ApiKeyHash,
                Expr::value(new_hash.to_string()),
            )
            .col_expr(
                trusted_client::Column::Version,
                Expr::col(trusted_client::Column::Version).add(1),
            )
            .filter(trusted_client::Column::Id.eq(id))
            .filter(trusted_client::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await
            .map_err(|e| map_write_err(e, DUPLICATE_KEY))?;

        if result.rows_affected == 0 {
            return Err(GatewayError::edit_conflict());
        }
        self.find_trusted_client_by_id(id)
            .await?
            .ok_or_else(GatewayError::edit_conflict)
    }

    pub(super) async fn delete_trusted_client_row(&self, id: i64) -> Result<()> {
        let txn = self.db.begin().await.map_err(GatewayError::Database)?;

        entities::TrustedClientLog::delete_many()
            .filter(trusted_client_log::Column::ClientId.eq(id))
            .exec(&txn)
            .await
            .map_err(GatewayError::Database)?;

        let result = entities::TrustedClient::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(GatewayError::Database)?;
        if result.rows_affected == 0 {
            txn.rollback().await.map_err(GatewayError::Database)?;
            return Err(GatewayError::not_found("trusted client not found"));
        }

        txn.commit().await.map_err(GatewayError::Database)
    }

    pub(super) async fn insert_trusted_client_log_row(&self, entry: TrustedClientLog) -> Result<()> {
        let active_model = trusted_client_log::ActiveModel {
            client_id: Set(entry.client_id),
            endpoint: Set(entry.endpoint),
            method: Set(entry.method),
            status_code: Set(i32::from(entry.status_code)),
            created_at: Set(entry.created_at.into()),
            ..Default::default()
        };
        entities::TrustedClientLog::insert(active_model)
            .exec_without_returning(&self.db)
            .await
            .map_err(GatewayError::Database)?;
        Ok(())
    }
}
