//! # DietaryPreferenceRepository
//!
//! 食事嗜好の読み取りを担当するリポジトリ。
//! 食事生成とレシピ提案のコンテキストに使う。行の登録はこの API の外で行われる。

use async_trait::async_trait;
use fitplan_domain::{
   dietary::{DietaryPreference, DietaryPreferenceId, PreferenceKind},
   user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::UserConnection, error::InfraError};

/// 食事嗜好リポジトリトレイト
#[async_trait]
pub trait DietaryPreferenceRepository: Send + Sync {
   async fn find_all_by_user(
      &self,
      user_id: &UserId,
   ) -> Result<Vec<DietaryPreference>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct DietaryPreferenceRow {
   id:              Uuid,
   user_id:         Uuid,
   preference_type: String,
   value:           String,
}

impl TryFrom<DietaryPreferenceRow> for DietaryPreference {
   type Error = InfraError;

   fn try_from(row: DietaryPreferenceRow) -> Result<Self, Self::Error> {
      let kind = row
         .preference_type
         .parse::<PreferenceKind>()
         .map_err(|e| InfraError::corrupted("dietary_preferences.preference_type", e))?;

      Ok(Self {
         id: DietaryPreferenceId::from_uuid(row.id),
         user_id: UserId::from_uuid(row.user_id),
         kind,
         value: row.value,
      })
   }
}

/// PostgreSQL 実装の DietaryPreferenceRepository
#[derive(Debug, Clone)]
pub struct PostgresDietaryPreferenceRepository {
   pool: PgPool,
}

impl PostgresDietaryPreferenceRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl DietaryPreferenceRepository for PostgresDietaryPreferenceRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
   async fn find_all_by_user(
      &self,
      user_id: &UserId,
   ) -> Result<Vec<DietaryPreference>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let rows: Vec<DietaryPreferenceRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, preference_type, value
         FROM dietary_preferences
         WHERE user_id = $1
         ORDER BY created_at ASC
         "#,
      )
      .bind(user_id.as_uuid())
      .fetch_all(&mut *conn)
      .await?;

      rows.into_iter().map(DietaryPreference::try_from).collect()
   }
}
