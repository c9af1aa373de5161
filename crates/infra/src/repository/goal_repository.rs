//! # GoalRepository
//!
//! 目標の永続化を担当するリポジトリ。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fitplan_domain::{
   goal::{Goal, GoalId},
   user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
   db::{TxContext, UserConnection},
   error::InfraError,
};

/// 目標リポジトリトレイト
#[async_trait]
pub trait GoalRepository: Send + Sync {
   /// 本人の目標を作成日時の新しい順で取得する
   async fn find_all_by_user(&self, user_id: &UserId) -> Result<Vec<Goal>, InfraError>;

   /// 目標を挿入する
   async fn insert(&self, tx: &mut TxContext, goal: &Goal) -> Result<(), InfraError>;
}

#[derive(sqlx::FromRow)]
struct GoalRow {
   id:            Uuid,
   user_id:       Uuid,
   goal_type:     String,
   target_value:  Option<f64>,
   current_value: Option<f64>,
   unit:          Option<String>,
   deadline:      Option<NaiveDate>,
   created_at:    DateTime<Utc>,
   updated_at:    DateTime<Utc>,
}

impl From<GoalRow> for Goal {
   fn from(row: GoalRow) -> Self {
      Self {
         id:            GoalId::from_uuid(row.id),
         user_id:       UserId::from_uuid(row.user_id),
         goal_type:     row.goal_type,
         target_value:  row.target_value,
         current_value: row.current_value,
         unit:          row.unit,
         deadline:      row.deadline,
         created_at:    row.created_at,
         updated_at:    row.updated_at,
      }
   }
}

/// PostgreSQL 実装の GoalRepository
#[derive(Debug, Clone)]
pub struct PostgresGoalRepository {
   pool: PgPool,
}

impl PostgresGoalRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl GoalRepository for PostgresGoalRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
   async fn find_all_by_user(&self, user_id: &UserId) -> Result<Vec<Goal>, InfraError> {
      let mut conn = UserConnection::acquire(&self.pool, user_id).await?;
      let rows: Vec<GoalRow> = sqlx::query_as(
         r#"
         SELECT id, user_id, goal_type, target_value, current_value, unit,
               deadline, created_at, updated_at
         FROM user_goals
         WHERE user_id = $1
         ORDER BY created_at DESC
         "#,
      )
      .bind(user_id.as_uuid())
      .fetch_all(&mut *conn)
      .await?;

      Ok(rows.into_iter().map(Goal::from).collect())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(goal_id = %goal.id))]
   async fn insert(&self, tx: &mut TxContext, goal: &Goal) -> Result<(), InfraError> {
      sqlx::query(
         r#"
         INSERT INTO user_goals
            (id, user_id, goal_type, target_value, current_value, unit,
             deadline, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         "#,
      )
      .bind(goal.id.as_uuid())
      .bind(goal.user_id.as_uuid())
      .bind(&goal.goal_type)
      .bind(goal.target_value)
      .bind(goal.current_value)
      .bind(&goal.unit)
      .bind(goal.deadline)
      .bind(goal.created_at)
      .bind(goal.updated_at)
      .execute(tx.conn())
      .await?;

      Ok(())
   }
}
