//! # IntegrationRepository
//!
//! 外部サービス連携（OAuth 資格情報）の永続化を担当するリポジトリ。
//!
//! 接続は `UNIQUE (user_id, provider)` に対する upsert で、再接続は
//! 既存の行（ID は維持）のトークンとメタデータを上書きする。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fitplan_domain::{
   integration::{
      ExternalIntegration,
      IntegrationId,
      IntegrationMetadata,
      OAuthTokens,
      Provider,
   },
   user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
   db::{TxContext, UserConnection},
   error::InfraError,
};

/// 外部連携リポジトリトレイト
#[async_trait]
pub trait IntegrationRepository: Send + Sync {
   /// 本人の連携を接続日時の新しい順で取得する
   async fn find_all_by_user(
      &self,
      user_id: &UserId,
   ) -> Result<Vec<ExternalIntegration>, InfraError>;

   async fn find_by_provider(
      &self,
      user_id: &UserId,
      provider: Provider,
   ) -> Result<Option<ExternalIntegration>, InfraError>;

   /// 連携を作成または上書きし、保存後の状態を返す
   async fn upsert(
      &self,
      tx: &mut TxContext,
      integration: &ExternalIntegration,
   ) -> Result<ExternalIntegration, InfraError>;

   /// リフレッシュ後のトークンを保存する
   async fn update_tokens(
      &self,
      tx: &mut TxContext,
      id: &IntegrationId,
      tokens: &OAuthTokens,
   ) -> Result<(), InfraError>;

   /// 最終同期日時を記録する
   async fn touch_last_synced(
      &self,
      tx: &mut TxContext,
      id: &IntegrationId,
      synced_at: DateTime<Utc>,
   ) -> Result<(), InfraError>;

   /// ID で連携を削除する（対象が存在しなければ `false`）
   async fn delete_by_id(
      &self,
      tx: &mut TxContext,
      user_id: &UserId,
      id: &IntegrationId,
   ) -> Result<bool, InfraError>;

   /// プロバイダで連携を削除する（対象が存在しなければ `false`）
   async fn delete_by_provider(
      &self,
      tx: &mut TxContext,
      user_id: &UserId,
      provider: Provider,
   ) -> Result<bool, InfraError>;
}

#[derive(sqlx::FromRow)]
struct IntegrationRow {
   id:               Uuid,
   user_id:          Uuid,
   provider:         String,
   access_token:     String,
   refresh_token:    String,
   token_expires_at: DateTime<Utc>,
   connected_at:     DateTime<Utc>,
   last_synced_at:   Option<DateTime<Utc>>,
   is_active:        bool,
   metadata:         serde_json::Value,
}

impl TryFrom<IntegrationRow> for ExternalIntegration {
   type Error = InfraError;

   fn try_from(row: IntegrationRow) -> Result<Self, Self::Error> {
      let provider = row
         .provider
         .parse::<Provider>()
         .map_err(|e| InfraError::corrupted("external_integrations.provider", e))?;
      let metadata: IntegrationMetadata = serde_json::from_value(row.metadata)?;

      Ok(Self::from_db(
         IntegrationId::from_uuid(row.id),
         UserId::from_uuid(row.user_id),
         provider,
         OAuthTokens {
            access_token:  row.access_token,
            refresh_token: row.refresh_token,
            expires_at:    row.token_expires_at,
         },
         row.connected_at,
         row.last_synced_at,
         row.is_active,
         metadata,
      ))
   }
}

/// PostgreSQL 実装の IntegrationRepository
#[derive(Debug, Clone)]
pub struct PostgresIntegrationRepository {
   pool: PgPool,
}

impl PostgresIntegrationRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl IntegrationRepository for PostgresIntegrationRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
   async fn find_all_by_user(
      &self,
      user_id: &UserId,
   ) -> Result<Vec<ExternalIntegration>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let rows: Vec<IntegrationRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, provider, access_token, refresh_token, token_expires_at,
               connected_at, last_synced_at, is_active, metadata
         FROM external_integrations
         WHERE user_id = $1
         ORDER BY connected_at DESC
         "#,
      )
      .bind(user_id.as_uuid())
      .fetch_all(&mut *conn)
      .await?;

      rows.into_iter().map(ExternalIntegration::try_from).collect()
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %provider))]
   async fn find_by_provider(
      &self,
      user_id: &UserId,
      provider: Provider,
   ) -> Result<Option<ExternalIntegration>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let provider_str: &'static str = provider.into();
      let row: Option<IntegrationRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, provider, access_token, refresh_token, token_expires_at,
               connected_at, last_synced_at, is_active, metadata
         FROM external_integrations
         WHERE user_id = $1 AND provider = $2
         "#,
      )
      .bind(user_id.as_uuid())
      .bind(provider_str)
      .fetch_optional(&mut *conn)
      .await?;

      row.map(ExternalIntegration::try_from).transpose()
   }

   #[tracing::instrument(
      skip_all,
      level = "debug",
      fields(user_id = %integration.user_id(), provider = %integration.provider())
   )]
   async fn upsert(
      &self,
      tx: &mut TxContext,
      integration: &ExternalIntegration,
   ) -> Result<ExternalIntegration, InfraError> {
      let provider: &'static str = integration.provider().into();
      let metadata = serde_json::to_value(integration.metadata())?;
      let tokens = integration.tokens();

      let row: IntegrationRow = sqlx::query_as(
         r#"
         INSERT INTO external_integrations
            (id, user_id, provider, access_token, refresh_token, token_expires_at,
             connected_at, last_synced_at, is_active, metadata)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         ON CONFLICT (user_id, provider) DO UPDATE
         SET access_token = EXCLUDED.access_token,
            refresh_token = EXCLUDED.refresh_token,
            token_expires_at = EXCLUDED.token_expires_at,
            connected_at = EXCLUDED.connected_at,
            is_active = EXCLUDED.is_active,
            metadata = EXCLUDED.metadata
         RETURNING id, user_id, provider, access_token, refresh_token, token_expires_at,
                 connected_at, last_synced_at, is_active, metadata
         "#,
      )
      .bind(integration.id().as_uuid())
      .bind(integration.user_id().as_uuid())
      .bind(provider)
      .bind(&tokens.access_token)
      .bind(&tokens.refresh_token)
      .bind(tokens.expires_at)
      .bind(integration.connected_at())
      .bind(integration.last_synced_at())
      .bind(integration.is_active())
      .bind(metadata)
      .fetch_one(tx.conn())
      .await?;

      ExternalIntegration::try_from(row)
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn update_tokens(
      &self,
      tx: &mut TxContext,
      id: &IntegrationId,
      tokens: &OAuthTokens,
   ) -> Result<(), InfraError> {
      sqlx::query(
         r#"
         UPDATE external_integrations
         SET access_token = $2, refresh_token = $3, token_expires_at = $4
         WHERE id = $1
         "#,
      )
      .bind(id.as_uuid())
      .bind(&tokens.access_token)
      .bind(&tokens.refresh_token)
      .bind(tokens.expires_at)
      .execute(tx.conn())
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn touch_last_synced(
      &self,
      tx: &mut TxContext,
      id: &IntegrationId,
      synced_at: DateTime<Utc>,
   ) -> Result<(), InfraError> {
      sqlx::query("UPDATE external_integrations SET last_synced_at = $2 WHERE id = $1")
         .bind(id.as_uuid())
         .bind(synced_at)
         .execute(tx.conn())
         .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %id))]
   async fn delete_by_id(
      &self,
      tx: &mut TxContext,
      user_id: &UserId,
      id: &IntegrationId,
   ) -> Result<bool, InfraError> {
      let result =
         sqlx::query("DELETE FROM external_integrations WHERE id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(tx.conn())
            .await?;

      Ok(result.rows_affected() > 0)
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %provider))]
   async fn delete_by_provider(
      &self,
      tx: &mut TxContext,
      user_id: &UserId,
      provider: Provider,
   ) -> Result<bool, InfraError> {
      let provider_str: &'static str = provider.into();
      let result =
         sqlx::query("DELETE FROM external_integrations WHERE user_id = $1 AND provider = $2")
            .bind(user_id.as_uuid())
            .bind(provider_str)
            .execute(tx.conn())
            .await?;

      Ok(result.rows_affected() > 0)
   }
}
