//! # MealRepository
//!
//! 食事の永続化を担当するリポジトリ。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use fitplan_domain::{
   meal::{Meal, MealId, MealType},
   user::UserId,
   value_objects::DateRange,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
   db::{TxContext, UserConnection},
   error::InfraError,
};

/// 食事リポジトリトレイト
#[async_trait]
pub trait MealRepository: Send + Sync {
   /// 期間内の食事を予定日の昇順で取得する
   async fn find_by_range(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<Meal>, InfraError>;

   /// 直近の食事を予定日の新しい順で `limit` 件取得する
   async fn find_recent(&self, user_id: &UserId, limit: i64) -> Result<Vec<Meal>, InfraError>;

   async fn find_by_id(&self, user_id: &UserId, id: &MealId) -> Result<Option<Meal>, InfraError>;

   async fn insert(&self, tx: &mut TxContext, meal: &Meal) -> Result<(), InfraError>;

   async fn update(&self, tx: &mut TxContext, meal: &Meal) -> Result<(), InfraError>;

   /// 食事を削除する（対象が存在しなければ `false`）
   async fn delete(
      &self,
      tx: &mut TxContext,
      user_id: &UserId,
      id: &MealId,
   ) -> Result<bool, InfraError>;
}

#[derive(sqlx::FromRow)]
struct MealRow {
   id:             Uuid,
   user_id:        Uuid,
   title:          String,
   description:    Option<String>,
   meal_type:      String,
   calories:       Option<i32>,
   protein_g:      Option<f64>,
   carbs_g:        Option<f64>,
   fat_g:          Option<f64>,
   ingredients:    Option<serde_json::Value>,
   recipe_url:     Option<String>,
   scheduled_date: NaiveDate,
   scheduled_time: Option<NaiveTime>,
   notes:          Option<String>,
   completed:      bool,
   completed_at:   Option<DateTime<Utc>>,
   created_at:     DateTime<Utc>,
   updated_at:     DateTime<Utc>,
}

impl TryFrom<MealRow> for Meal {
   type Error = InfraError;

   fn try_from(row: MealRow) -> Result<Self, Self::Error> {
      let meal_type = row
         .meal_type
         .parse::<MealType>()
         .map_err(|e| InfraError::corrupted("meals.meal_type", e))?;

      Ok(Self {
         id: MealId::from_uuid(row.id),
         user_id: UserId::from_uuid(row.user_id),
         title: row.title,
         description: row.description,
         meal_type,
         calories: row.calories,
         protein_g: row.protein_g,
         carbs_g: row.carbs_g,
         fat_g: row.fat_g,
         ingredients: row.ingredients,
         recipe_url: row.recipe_url,
         scheduled_date: row.scheduled_date,
         scheduled_time: row.scheduled_time,
         notes: row.notes,
         completed: row.completed,
         completed_at: row.completed_at,
         created_at: row.created_at,
         updated_at: row.updated_at,
      })
   }
}

/// PostgreSQL 実装の MealRepository
#[derive(Debug, Clone)]
pub struct PostgresMealRepository {
   pool: PgPool,
}

impl PostgresMealRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl MealRepository for PostgresMealRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
   async fn find_by_range(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<Meal>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let rows: Vec<MealRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, title, description, meal_type, calories, protein_g,
               carbs_g, fat_g, ingredients, recipe_url, scheduled_date,
               scheduled_time, notes, completed, completed_at, created_at, updated_at
         FROM meals
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

      rows.into_iter().map(Meal::try_from).collect()
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, limit = limit))]
   async fn find_recent(&self, user_id: &UserId, limit: i64) -> Result<Vec<Meal>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let rows: Vec<MealRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, title, description, meal_type, calories, protein_g,
               carbs_g, fat_g, ingredients, recipe_url, scheduled_date,
               scheduled_time, notes, completed, completed_at, created_at, updated_at
         FROM meals
         WHERE user_id = $1
         ORDER BY scheduled_date DESC, created_at DESC
         LIMIT $2
         "#,
      )
      .bind(user_id.as_uuid())
      .bind(limit)
      .fetch_all(&mut *conn)
      .await?;

      rows.into_iter().map(Meal::try_from).collect()
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %id))]
   async fn find_by_id(&self, user_id: &UserId, id: &MealId) -> Result<Option<Meal>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let row: Option<MealRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, title, description, meal_type, calories, protein_g,
               carbs_g, fat_g, ingredients, recipe_url, scheduled_date,
               scheduled_time, notes, completed, completed_at, created_at, updated_at
         FROM meals
         WHERE id = $1 AND user_id = $2
         "#,
      )
      .bind(id.as_uuid())
      .bind(user_id.as_uuid())
      .fetch_optional(&mut *conn)
      .await?;

      row.map(Meal::try_from).transpose()
   }

   #[tracing::instrument(skip_all, level = "debug", fields(meal_id = %meal.id))]
   async fn insert(&self, tx: &mut TxContext, meal: &Meal) -> Result<(), InfraError> {
      let meal_type: &'static str = meal.meal_type.into();

      sqlx::query(
         r#"
         INSERT INTO meals
            (id, user_id, title, description, meal_type, calories, protein_g,
             carbs_g, fat_g, ingredients, recipe_url, scheduled_date,
             scheduled_time, notes, completed, completed_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
         "#,
      )
      .bind(meal.id.as_uuid())
      .bind(meal.user_id.as_uuid())
      .bind(&meal.title)
      .bind(&meal.description)
      .bind(meal_type)
      .bind(meal.calories)
      .bind(meal.protein_g)
      .bind(meal.carbs_g)
      .bind(meal.fat_g)
      .bind(&meal.ingredients)
      .bind(&meal.recipe_url)
      .bind(meal.scheduled_date)
      .bind(meal.scheduled_time)
      .bind(&meal.notes)
      .bind(meal.completed)
      .bind(meal.completed_at)
      .bind(meal.created_at)
      .bind(meal.updated_at)
      .execute(tx.conn())
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(meal_id = %meal.id))]
   async fn update(&self, tx: &mut TxContext, meal: &Meal) -> Result<(), InfraError> {
      sqlx::query(
         r#"
         UPDATE meals
         SET title = $3, description = $4, scheduled_date = $5, scheduled_time = $6,
            notes = $7, completed = $8, completed_at = $9, updated_at = $10
         WHERE id = $1 AND user_id = $2
         "#,
      )
      .bind(meal.id.as_uuid())
      .bind(meal.user_id.as_uuid())
      .bind(&meal.title)
      .bind(&meal.description)
      .bind(meal.scheduled_date)
      .bind(meal.scheduled_time)
      .bind(&meal.notes)
      .bind(meal.completed)
      .bind(meal.completed_at)
      .bind(meal.updated_at)
      .execute(tx.conn())
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%user_id, %id))]
   async fn delete(
      &self,
      tx: &mut TxContext,
      user_id: &UserId,
      id: &MealId,
   ) -> Result<bool, InfraError> {
      let result = sqlx::query("DELETE FROM meals WHERE id = $1 AND user_id = $2")
         .bind(id.as_uuid())
         .bind(user_id.as_uuid())
         .execute(tx.conn())
         .await?;

      Ok(result.rows_affected() > 0)
   }
}
