//! ワークアウト記録ユースケース

use std::sync::Arc;

use fitplan_domain::{
   clock::Clock,
   user::UserId,
   value_objects::{DateRange, ItemUpdate},
   workout::{NewWorkout, Workout, WorkoutId},
};
use fitplan_infra::{db::TransactionManager, repository::WorkoutRepository};

use super::helpers::{FindResultExt, ensure_deleted};
use crate::error::BffError;

const ENTITY: &str = "Workout";

/// ワークアウト記録ユースケース
pub struct WorkoutUseCaseImpl {
   workouts:   Arc<dyn WorkoutRepository>,
   tx_manager: Arc<dyn TransactionManager>,
   clock:      Arc<dyn Clock>,
}

impl WorkoutUseCaseImpl {
   pub fn new(
      workouts: Arc<dyn WorkoutRepository>,
      tx_manager: Arc<dyn TransactionManager>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         workouts,
         tx_manager,
         clock,
      }
   }

   /// 期間内のワークアウトを予定日順で取得する
   pub async fn list(&self, user_id: &UserId, range: &DateRange) -> Result<Vec<Workout>, BffError> {
      Ok(self.workouts.find_by_range(user_id, range).await?)
   }

   pub async fn create(&self, user_id: &UserId, input: NewWorkout) -> Result<Workout, BffError> {
      let workout = input.into_workout(WorkoutId::new(), user_id.clone(), self.clock.now());

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.workouts.insert(&mut tx, &workout).await?;
      tx.commit().await?;

      Ok(workout)
   }

   /// 部分更新する（本人の行でなければ 404）
   pub async fn update(
      &self,
      user_id: &UserId,
      id: &WorkoutId,
      update: ItemUpdate,
   ) -> Result<Workout, BffError> {
      if update.is_empty() {
         return Err(BffError::BadRequest("No fields to update".to_string()));
      }

      let current = self.workouts.find_by_id(user_id, id).await.or_not_found(ENTITY)?;
      let workout = current.updated(update, self.clock.now());

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.workouts.update(&mut tx, &workout).await?;
      tx.commit().await?;

      Ok(workout)
   }

   pub async fn delete(&self, user_id: &UserId, id: &WorkoutId) -> Result<(), BffError> {
      let mut tx = self.tx_manager.begin(user_id).await?;
      let deleted = self.workouts.delete(&mut tx, user_id, id).await?;
      tx.commit().await?;

      ensure_deleted(deleted, ENTITY)
   }
}
