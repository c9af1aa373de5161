//! # ScheduleGenerationRepository
//!
//! 日ごとのスケジュール生成記録を扱うリポジトリ。
//!
//! ## claim
//!
//! 主キー `(user_id, schedule_date)` への INSERT が成功したリクエストだけが
//! その日を生成する。`pending` のまま [`CLAIM_TIMEOUT_MINUTES`] 分を過ぎた記録は
//! 放棄されたとみなし、`ON CONFLICT DO UPDATE ... WHERE` で再 claim できる。
//! 同時に 2 リクエストが来ても行ロックにより片方だけが成功する。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fitplan_domain::{
   schedule::{CLAIM_TIMEOUT_MINUTES, GenerationStatus, ScheduleGeneration},
   user::UserId,
};
use sqlx::PgPool;

use crate::{
   db::{TxContext, UserConnection},
   error::InfraError,
};

/// スケジュール生成記録リポジトリトレイト
#[async_trait]
pub trait ScheduleGenerationRepository: Send + Sync {
   /// 日付を claim する（成功すれば `true`）
   ///
   /// 生成処理の長いトランザクションと分けるため、自前の短いトランザクションで確定する。
   async fn claim(
      &self,
      user_id: &UserId,
      schedule_date: NaiveDate,
      now: DateTime<Utc>,
   ) -> Result<bool, InfraError>;

   /// 生成結果と同じトランザクションで completed にする
   async fn complete(
      &self,
      tx: &mut TxContext,
      user_id: &UserId,
      schedule_date: NaiveDate,
      now: DateTime<Utc>,
   ) -> Result<(), InfraError>;

   /// 生成に失敗した claim を解放する（pending の記録だけを削除する）
   async fn release(&self, user_id: &UserId, schedule_date: NaiveDate) -> Result<(), InfraError>;

   async fn find(
      &self,
      user_id: &UserId,
      schedule_date: NaiveDate,
   ) -> Result<Option<ScheduleGeneration>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct ScheduleGenerationRow {
   user_id:       uuid::Uuid,
   schedule_date: NaiveDate,
   status:        String,
   claimed_at:    DateTime<Utc>,
   completed_at:  Option<DateTime<Utc>>,
}

impl TryFrom<ScheduleGenerationRow> for ScheduleGeneration {
   type Error = InfraError;

   fn try_from(row: ScheduleGenerationRow) -> Result<Self, Self::Error> {
      let status = row
         .status
         .parse::<GenerationStatus>()
         .map_err(|e| InfraError::corrupted("schedule_generations.status", e))?;

      Ok(Self::from_db(
         UserId::from_uuid(row.user_id),
         row.schedule_date,
         status,
         row.claimed_at,
         row.completed_at,
      ))
   }
}

/// PostgreSQL 実装の ScheduleGenerationRepository
#[derive(Debug, Clone)]
pub struct PostgresScheduleGenerationRepository {
   pool: PgPool,
}

impl PostgresScheduleGenerationRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl ScheduleGenerationRepository for PostgresScheduleGenerationRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %schedule_date))]
   async fn claim(
      &self,
      user_id: &UserId,
      schedule_date: NaiveDate,
      now: DateTime<Utc>,
   ) -> Result<bool, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let pending: &'static str = GenerationStatus::Pending.into();
      let result = sqlx::query(
         r#"
         INSERT INTO schedule_generations (user_id, schedule_date, status, claimed_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (user_id, schedule_date) DO UPDATE
         SET claimed_at = EXCLUDED.claimed_at
         WHERE schedule_generations.status = $3
           AND schedule_generations.claimed_at <= $4 - make_interval(mins => $5)
         "#,
      )
      .bind(user_id.as_uuid())
      .bind(schedule_date)
      .bind(pending)
      .bind(now)
      .bind(CLAIM_TIMEOUT_MINUTES as i32)
      .execute(&mut *conn)
      .await?;

      Ok(result.rows_affected() == 1)
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %schedule_date))]
   async fn complete(
      &self,
      tx: &mut TxContext,
      user_id: &UserId,
      schedule_date: NaiveDate,
      now: DateTime<Utc>,
   ) -> Result<(), InfraError> {
      let completed: &'static str = GenerationStatus::Completed.into();
      sqlx::query(
         r#"
         UPDATE schedule_generations
         SET status = $3, completed_at = $4
         WHERE user_id = $1 AND schedule_date = $2
         "#,
      )
      .bind(user_id.as_uuid())
      .bind(schedule_date)
      .bind(completed)
      .bind(now)
      .execute(tx.conn())
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %schedule_date))]
   async fn release(&self, user_id: &UserId, schedule_date: NaiveDate) -> Result<(), InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let pending: &'static str = GenerationStatus::Pending.into();
      sqlx::query(
         r#"
         DELETE FROM schedule_generations
         WHERE user_id = $1 AND schedule_date = $2 AND status = $3
         "#,
      )
      .bind(user_id.as_uuid())
      .bind(schedule_date)
      .bind(pending)
      .execute(&mut *conn)
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %schedule_date))]
   async fn find(
      &self,
      user_id: &UserId,
      schedule_date: NaiveDate,
   ) -> Result<Option<ScheduleGeneration>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let row: Option<ScheduleGenerationRow> = sqlx::query_as(
         r#"
         SELECT user_id, schedule_date, status, claimed_at, completed_at
         FROM schedule_generations
         WHERE user_id = $1 AND schedule_date = $2
         "#,
      )
      .bind(user_id.as_uuid())
      .bind(schedule_date)
      .fetch_optional(&mut *conn)
      .await?;

      row.map(ScheduleGeneration::try_from).transpose()
   }
}
