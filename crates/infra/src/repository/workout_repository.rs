//! # WorkoutRepository
//!
//! ワークアウトの永続化を担当するリポジトリ。
//!
//! ## 外部サービスからの取り込み
//!
//! [`WorkoutRepository::insert_synced`] は
//! `UNIQUE (user_id, source_provider, external_id)` に対する
//! `ON CONFLICT DO NOTHING` で挿入し、実際に挿入されたかを返す。
//! 同期処理は戻り値で新規 / 読み飛ばしを数える。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use fitplan_domain::{
   user::UserId,
   value_objects::DateRange,
   workout::{ExternalSource, Workout, WorkoutId},
};
use sqlx::{
   PgPool,
   Postgres,
   postgres::PgArguments,
   query::Query,
};
use uuid::Uuid;

use crate::{
   db::{TxContext, UserConnection},
   error::InfraError,
};

/// ワークアウトリポジトリトレイト
#[async_trait]
pub trait WorkoutRepository: Send + Sync {
   /// 期間内のワークアウトを予定日の昇順で取得する
   async fn find_by_range(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<Workout>, InfraError>;

   /// 直近のワークアウトを予定日の新しい順で `limit` 件取得する
   async fn find_recent(&self, user_id: &UserId, limit: i64) -> Result<Vec<Workout>, InfraError>;

   /// ID でワークアウトを検索する
   async fn find_by_id(
      &self,
      user_id: &UserId,
      id: &WorkoutId,
   ) -> Result<Option<Workout>, InfraError>;

   /// ワークアウトを挿入する
   async fn insert(&self, tx: &mut TxContext, workout: &Workout) -> Result<(), InfraError>;

   /// 外部サービス由来のワークアウトを挿入する
   ///
   /// 同じ `(user_id, source_provider, external_id)` が既にあれば何もせず `false` を返す。
   async fn insert_synced(&self, tx: &mut TxContext, workout: &Workout)
   -> Result<bool, InfraError>;

   /// ワークアウトを更新する
   async fn update(&self, tx: &mut TxContext, workout: &Workout) -> Result<(), InfraError>;

   /// ワークアウトを削除する（対象が存在しなければ `false`）
   async fn delete(
      &self,
      tx: &mut TxContext,
      user_id: &UserId,
      id: &WorkoutId,
   ) -> Result<bool, InfraError>;
}

#[derive(sqlx::FromRow)]
struct WorkoutRow {
   id:               Uuid,
   user_id:          Uuid,
   title:            String,
   description:      Option<String>,
   workout_type:     String,
   duration_minutes: Option<i32>,
   calories_burned:  Option<i32>,
   intensity:        Option<String>,
   scheduled_date:   NaiveDate,
   scheduled_time:   Option<NaiveTime>,
   notes:            Option<String>,
   completed:        bool,
   completed_at:     Option<DateTime<Utc>>,
   source_provider:  Option<String>,
   external_id:      Option<String>,
   created_at:       DateTime<Utc>,
   updated_at:       DateTime<Utc>,
}

impl From<WorkoutRow> for Workout {
   fn from(row: WorkoutRow) -> Self {
      let source = match (row.source_provider, row.external_id) {
         (Some(provider), Some(external_id)) => Some(ExternalSource {
            provider,
            external_id,
         }),
         _ => None,
      };

      Self {
         id: WorkoutId::from_uuid(row.id),
         user_id: UserId::from_uuid(row.user_id),
         title: row.title,
         description: row.description,
         workout_type: row.workout_type,
         duration_minutes: row.duration_minutes,
         calories_burned: row.calories_burned,
         intensity: row.intensity,
         scheduled_date: row.scheduled_date,
         scheduled_time: row.scheduled_time,
         notes: row.notes,
         completed: row.completed,
         completed_at: row.completed_at,
         source,
         created_at: row.created_at,
         updated_at: row.updated_at,
      }
   }
}

/// PostgreSQL 実装の WorkoutRepository
#[derive(Debug, Clone)]
pub struct PostgresWorkoutRepository {
   pool: PgPool,
}

impl PostgresWorkoutRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl WorkoutRepository for PostgresWorkoutRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
   async fn find_by_range(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<Workout>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let rows: Vec<WorkoutRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, title, description, workout_type, duration_minutes,
               calories_burned, intensity, scheduled_date, scheduled_time, notes,
               completed, completed_at, source_provider, external_id,
               created_at, updated_at
         FROM workouts
         WHERE user_id = $1
           AND ($2::date IS NULL OR scheduled_date >= $2)
           AND ($3::date IS NULL OR scheduled_date <= $3)
         ORDER BY scheduled_date ASC, scheduled_time ASC NULLS LAST, created_at ASC
         "#,
      )
      .bind(user_id.as_uuid())
      .bind(range.start())
      .bind(range.end())
      .fetch_all(&mut *conn)
      .await?;

      Ok(rows.into_iter().map(Workout::from).collect())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, limit = limit))]
   async fn find_recent(&self, user_id: &UserId, limit: i64) -> Result<Vec<Workout>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let rows: Vec<WorkoutRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, title, description, workout_type, duration_minutes,
               calories_burned, intensity, scheduled_date, scheduled_time, notes,
               completed, completed_at, source_provider, external_id,
               created_at, updated_at
         FROM workouts
         WHERE user_id = $1
         ORDER BY scheduled_date DESC, created_at DESC
         LIMIT $2
         "#,
      )
      .bind(user_id.as_uuid())
      .bind(limit)
      .fetch_all(&mut *conn)
      .await?;

      Ok(rows.into_iter().map(Workout::from).collect())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %id))]
   async fn find_by_id(
      &self,
      user_id: &UserId,
      id: &WorkoutId,
   ) -> Result<Option<Workout>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let row: Option<WorkoutRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, title, description, workout_type, duration_minutes,
               calories_burned, intensity, scheduled_date, scheduled_time, notes,
               completed, completed_at, source_provider, external_id,
               created_at, updated_at
         FROM workouts
         WHERE id = $1 AND user_id = $2
         "#,
      )
      .bind(id.as_uuid())
      .bind(user_id.as_uuid())
      .fetch_optional(&mut *conn)
      .await?;

      Ok(row.map(Workout::from))
   }

   #[tracing::instrument(skip_all, level = "debug", fields(workout_id = %workout.id))]
   async fn insert(&self, tx: &mut TxContext, workout: &Workout) -> Result<(), InfraError> {
      bind_insert(INSERT_SQL, workout).execute(tx.conn()).await?;
      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(workout_id = %workout.id))]
   async fn insert_synced(
      &self,
      tx: &mut TxContext,
      workout: &Workout,
   ) -> Result<bool, InfraError> {
      let result = bind_insert(INSERT_SYNCED_SQL, workout)
         .execute(tx.conn())
         .await?;
      Ok(result.rows_affected() == 1)
   }

   #[tracing::instrument(skip_all, level = "debug", fields(workout_id = %workout.id))]
   async fn update(&self, tx: &mut TxContext, workout: &Workout) -> Result<(), InfraError> {
      sqlx::query(
         r#"
         UPDATE workouts
         SET title = $3, description = $4, scheduled_date = $5, scheduled_time = $6,
            notes = $7, completed = $8, completed_at = $9, updated_at = $10
         WHERE id = $1 AND user_id = $2
         "#,
      )
      .bind(workout.id.as_uuid())
      .bind(workout.user_id.as_uuid())
      .bind(&workout.title)
      .bind(&workout.description)
      .bind(workout.scheduled_date)
      .bind(workout.scheduled_time)
      .bind(&workout.notes)
      .bind(workout.completed)
      .bind(workout.completed_at)
      .bind(workout.updated_at)
      .execute(tx.conn())
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %id))]
   async fn delete(
      &self,
      tx: &mut TxContext,
      user_id: &UserId,
      id: &WorkoutId,
   ) -> Result<bool, InfraError> {
      let result = sqlx::query("DELETE FROM workouts WHERE id = $1 AND user_id = $2")
         .bind(id.as_uuid())
         .bind(user_id.as_uuid())
         .execute(tx.conn())
         .await?;

      Ok(result.rows_affected() > 0)
   }
}

const INSERT_SQL: &str = r#"
   INSERT INTO workouts
      (id, user_id, title, description, workout_type, duration_minutes,
       calories_burned, intensity, scheduled_date, scheduled_time, notes,
       completed, completed_at, source_provider, external_id,
       created_at, updated_at)
   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
"#;

const INSERT_SYNCED_SQL: &str = r#"
   INSERT INTO workouts
      (id, user_id, title, description, workout_type, duration_minutes,
       calories_burned, intensity, scheduled_date, scheduled_time, notes,
       completed, completed_at, source_provider, external_id,
       created_at, updated_at)
   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
   ON CONFLICT (user_id, source_provider, external_id) DO NOTHING
"#;

/// `INSERT_SQL` / `INSERT_SYNCED_SQL` の 17 パラメータを束縛する
fn bind_insert<'q>(sql: &'q str, workout: &'q Workout) -> Query<'q, Postgres, PgArguments> {
   let source = workout.source.as_ref();
   sqlx::query(sql)
      .bind(workout.id.as_uuid())
      .bind(workout.user_id.as_uuid())
      .bind(&workout.title)
      .bind(&workout.description)
      .bind(&workout.workout_type)
      .bind(workout.duration_minutes)
      .bind(workout.calories_burned)
      .bind(&workout.intensity)
      .bind(workout.scheduled_date)
      .bind(workout.scheduled_time)
      .bind(&workout.notes)
      .bind(workout.completed)
      .bind(workout.completed_at)
      .bind(source.map(|s| s.provider.as_str()))
      .bind(source.map(|s| s.external_id.as_str()))
      .bind(workout.created_at)
      .bind(workout.updated_at)
}
