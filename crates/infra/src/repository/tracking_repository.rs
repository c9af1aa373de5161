//! # TrackingRepository
//!
//! 睡眠・体重・水分摂取の記録を扱うリポジトリ。
//! 3 種とも「追記」と「日付範囲を新しい順で取得」だけを持つ。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fitplan_domain::{
   tracking::{SampleId, SleepEntry, WaterIntake, WeightEntry},
   user::UserId,
   value_objects::DateRange,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
   db::{TxContext, UserConnection},
   error::InfraError,
};

/// 健康記録リポジトリトレイト
#[async_trait]
pub trait TrackingRepository: Send + Sync {
   async fn insert_sleep(&self, tx: &mut TxContext, entry: &SleepEntry)
   -> Result<(), InfraError>;

   async fn find_sleep(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<SleepEntry>, InfraError>;

   async fn insert_weight(
      &self,
      tx: &mut TxContext,
      entry: &WeightEntry,
   ) -> Result<(), InfraError>;

   async fn find_weight(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<WeightEntry>, InfraError>;

   async fn insert_water(
      &self,
      tx: &mut TxContext,
      entry: &WaterIntake,
   ) -> Result<(), InfraError>;

   async fn find_water(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<WaterIntake>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct SleepRow {
   id:             Uuid,
   user_id:        Uuid,
   date:           NaiveDate,
   duration_hours: f64,
   quality_rating: i16,
   notes:          Option<String>,
   created_at:     DateTime<Utc>,
}

impl From<SleepRow> for SleepEntry {
   fn from(row: SleepRow) -> Self {
      Self {
         id:             SampleId::from_uuid(row.id),
         user_id:        UserId::from_uuid(row.user_id),
         date:           row.date,
         duration_hours: row.duration_hours,
         quality_rating: row.quality_rating,
         notes:          row.notes,
         created_at:     row.created_at,
      }
   }
}

#[derive(sqlx::FromRow)]
struct WeightRow {
   id:         Uuid,
   user_id:    Uuid,
   date:       NaiveDate,
   weight_kg:  f64,
   notes:      Option<String>,
   created_at: DateTime<Utc>,
}

impl From<WeightRow> for WeightEntry {
   fn from(row: WeightRow) -> Self {
      Self {
         id:         SampleId::from_uuid(row.id),
         user_id:    UserId::from_uuid(row.user_id),
         date:       row.date,
         weight_kg:  row.weight_kg,
         notes:      row.notes,
         created_at: row.created_at,
      }
   }
}

#[derive(sqlx::FromRow)]
struct WaterRow {
   id:         Uuid,
   user_id:    Uuid,
   date:       NaiveDate,
   amount_ml:  i32,
   created_at: DateTime<Utc>,
}

impl From<WaterRow> for WaterIntake {
   fn from(row: WaterRow) -> Self {
      Self {
         id:         SampleId::from_uuid(row.id),
         user_id:    UserId::from_uuid(row.user_id),
         date:       row.date,
         amount_ml:  row.amount_ml,
         created_at: row.created_at,
      }
   }
}

/// PostgreSQL 実装の TrackingRepository
#[derive(Debug, Clone)]
pub struct PostgresTrackingRepository {
   pool: PgPool,
}

impl PostgresTrackingRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl TrackingRepository for PostgresTrackingRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(sample_id = %entry.id))]
   async fn insert_sleep(
      &self,
      tx: &mut TxContext,
      entry: &SleepEntry,
   ) -> Result<(), InfraError> {
      sqlx::query(
         r#"
         INSERT INTO sleep_tracking
            (id, user_id, date, duration_hours, quality_rating, notes, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         "#,
      )
      .bind(entry.id.as_uuid())
      .bind(entry.user_id.as_uuid())
      .bind(entry.date)
      .bind(entry.duration_hours)
      .bind(entry.quality_rating)
      .bind(&entry.notes)
      .bind(entry.created_at)
      .execute(tx.conn())
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
   async fn find_sleep(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<SleepEntry>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let rows: Vec<SleepRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, date, duration_hours, quality_rating, notes, created_at
         FROM sleep_tracking
         WHERE user_id = $1
           AND ($2::date IS NULL OR date >= $2)
           AND ($3::date IS NULL OR date <= $3)
         ORDER BY date DESC, created_at DESC
         "#,
      )
      .bind(user_id.as_uuid())
      .bind(range.start())
      .bind(range.end())
      .fetch_all(&mut *conn)
      .await?;

      Ok(rows.into_iter().map(SleepEntry::from).collect())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(sample_id = %entry.id))]
   async fn insert_weight(
      &self,
      tx: &mut TxContext,
      entry: &WeightEntry,
   ) -> Result<(), InfraError> {
      sqlx::query(
         r#"
         INSERT INTO weight_tracking (id, user_id, date, weight_kg, notes, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         "#,
      )
      .bind(entry.id.as_uuid())
      .bind(entry.user_id.as_uuid())
      .bind(entry.date)
      .bind(entry.weight_kg)
      .bind(&entry.notes)
      .bind(entry.created_at)
      .execute(tx.conn())
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
   async fn find_weight(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<WeightEntry>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let rows: Vec<WeightRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, date, weight_kg, notes, created_at
         FROM weight_tracking
         WHERE user_id = $1
           AND ($2::date IS NULL OR date >= $2)
           AND ($3::date IS NULL OR date <= $3)
         ORDER BY date DESC, created_at DESC
         "#,
      )
      .bind(user_id.as_uuid())
      .bind(range.start())
      .bind(range.end())
      .fetch_all(&mut *conn)
      .await?;

      Ok(rows.into_iter().map(WeightEntry::from).collect())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(sample_id = %entry.id))]
   async fn insert_water(
      &self,
      tx: &mut TxContext,
      entry: &WaterIntake,
   ) -> Result<(), InfraError> {
      sqlx::query(
         r#"
         INSERT INTO water_intake (id, user_id, date, amount_ml, created_at)
         VALUES ($1, $2, $3, $4, $5)
         "#,
      )
      .bind(entry.id.as_uuid())
      .bind(entry.user_id.as_uuid())
      .bind(entry.date)
      .bind(entry.amount_ml)
      .bind(entry.created_at)
      .execute(tx.conn())
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
   async fn find_water(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<WaterIntake>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let rows: Vec<WaterRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, date, amount_ml, created_at
         FROM water_intake
         WHERE user_id = $1
           AND ($2::date IS NULL OR date >= $2)
           AND ($3::date IS NULL OR date <= $3)
         ORDER BY date DESC, created_at DESC
         "#,
      )
      .bind(user_id.as_uuid())
      .bind(range.start())
      .bind(range.end())
      .fetch_all(&mut *conn)
      .await?;

      Ok(rows.into_iter().map(WaterIntake::from).collect())
   }
}
