//! # ProfileRepository
//!
//! プロフィールの永続化を担当するリポジトリ。
//!
//! 初回アクセス時のプロフィール作成は、まだ本人の行が存在しないため
//! [`ElevatedConnection`] 経由で行う。それ以外の読み書きは本人のスコープで実行する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fitplan_domain::{
   profile::{ActivityLevel, DisplayName, Gender, Profile},
   user::{Email, UserId},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
   db::{ElevatedConnection, TxContext, UserConnection},
   error::InfraError,
};

/// プロフィールリポジトリトレイト
#[async_trait]
pub trait ProfileRepository: Send + Sync {
   /// 本人のプロフィールを取得する
   async fn find_by_id(&self, user_id: &UserId) -> Result<Option<Profile>, InfraError>;

   /// プロフィールを初期作成する（既に存在すれば何もしない）
   async fn provision(&self, profile: &Profile) -> Result<(), InfraError>;

   /// プロフィールを更新する
   async fn update(&self, tx: &mut TxContext, profile: &Profile) -> Result<(), InfraError>;
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
   id:             Uuid,
   email:          String,
   display_name:   Option<String>,
   height_cm:      Option<i32>,
   weight_kg:      Option<f64>,
   age:            Option<i32>,
   gender:         Option<String>,
   activity_level: Option<String>,
   created_at:     DateTime<Utc>,
   updated_at:     DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
   type Error = InfraError;

   fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
      let email = Email::new(row.email).map_err(|e| InfraError::corrupted("profiles.email", e))?;
      let display_name = row
         .display_name
         .map(DisplayName::new)
         .transpose()
         .map_err(|e| InfraError::corrupted("profiles.display_name", e))?;
      let gender = row
         .gender
         .as_deref()
         .map(str::parse::<Gender>)
         .transpose()
         .map_err(|e| InfraError::corrupted("profiles.gender", e))?;
      let activity_level = row
         .activity_level
         .as_deref()
         .map(str::parse::<ActivityLevel>)
         .transpose()
         .map_err(|e| InfraError::corrupted("profiles.activity_level", e))?;

      Ok(Profile::from_db(
         UserId::from_uuid(row.id),
         email,
         display_name,
         row.height_cm,
         row.weight_kg,
         row.age,
         gender,
         activity_level,
         row.created_at,
         row.updated_at,
      ))
   }
}

/// PostgreSQL 実装の ProfileRepository
#[derive(Debug, Clone)]
pub struct PostgresProfileRepository {
   pool: PgPool,
}

impl PostgresProfileRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
   async fn find_by_id(&self, user_id: &UserId) -> Result<Option<Profile>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let row: Option<ProfileRow> = sqlx::query_as(
         r#"
         SELECT id, email, display_name, height_cm, weight_kg, age,
               gender, activity_level, created_at, updated_at
         FROM profiles
         WHERE id = $1
         "#,
      )
      .bind(user_id.as_uuid())
      .fetch_optional(&mut *conn)
      .await?;

      row.map(Profile::try_from).transpose()
   }

   #[tracing::instrument(skip_all, level = "debug", fields(user_id = %profile.id()))]
   async fn provision(&self, profile: &Profile) -> Result<(), InfraError> {
      let mut conn = ElevatedConnection::acquire(&self.pool).await?;
      sqlx::query(
         r#"
         INSERT INTO profiles (id, email, created_at, updated_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (id) DO NOTHING
         "#,
      )
      .bind(profile.id().as_uuid())
      .bind(profile.email().as_str())
      .bind(profile.created_at())
      .bind(profile.updated_at())
      .execute(&mut *conn)
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(user_id = %profile.id()))]
   async fn update(&self, tx: &mut TxContext, profile: &Profile) -> Result<(), InfraError> {
      let gender: Option<&'static str> = profile.gender().map(Into::into);
      let activity_level: Option<&'static str> = profile.activity_level().map(Into::into);

      sqlx::query(
         r#"
         UPDATE profiles
         SET display_name = $2, height_cm = $3, weight_kg = $4, age = $5,
            gender = $6, activity_level = $7, updated_at = $8
         WHERE id = $1
         "#,
      )
      .bind(profile.id().as_uuid())
      .bind(profile.display_name().map(DisplayName::as_str))
      .bind(profile.height_cm())
      .bind(profile.weight_kg())
      .bind(profile.age())
      .bind(gender)
      .bind(activity_level)
      .bind(profile.updated_at())
      .execute(tx.conn())
      .await?;

      Ok(())
   }
}
