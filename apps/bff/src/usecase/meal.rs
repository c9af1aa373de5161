//! 食事記録ユースケース

use std::sync::Arc;

use fitplan_domain::{
   clock::Clock,
   meal::{Meal, MealId, NewMeal},
   user::UserId,
   value_objects::{DateRange, ItemUpdate},
};
use fitplan_infra::{db::TransactionManager, repository::MealRepository};

use super::helpers::{FindResultExt, ensure_deleted};
use crate::error::BffError;

const ENTITY: &str = "Meal";

/// 食事記録ユースケース
pub struct MealUseCaseImpl {
   meals:      Arc<dyn MealRepository>,
   tx_manager: Arc<dyn TransactionManager>,
   clock:      Arc<dyn Clock>,
}

impl MealUseCaseImpl {
   pub fn new(
      meals: Arc<dyn MealRepository>,
      tx_manager: Arc<dyn TransactionManager>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         meals,
         tx_manager,
         clock,
      }
   }

   pub async fn list(&self, user_id: &UserId, range: &DateRange) -> Result<Vec<Meal>, BffError> {
      Ok(self.meals.find_by_range(user_id, range).await?)
   }

   pub async fn create(&self, user_id: &UserId, input: NewMeal) -> Result<Meal, BffError> {
      let meal = input.into_meal(MealId::new(), user_id.clone(), self.clock.now());

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.meals.insert(&mut tx, &meal).await?;
      tx.commit().await?;

      Ok(meal)
   }

   /// 部分更新する（本人の行でなければ 404）
   pub async fn update(
      &self,
      user_id: &UserId,
      id: &MealId,
      update: ItemUpdate,
   ) -> Result<Meal, BffError> {
      if update.is_empty() {
         return Err(BffError::BadRequest("No fields to update".to_string()));
      }

      let current = self.meals.find_by_id(user_id, id).await.or_not_found(ENTITY)?;
      let meal = current.updated(update, self.clock.now());

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.meals.update(&mut tx, &meal).await?;
      tx.commit().await?;

      Ok(meal)
   }

   pub async fn delete(&self, user_id: &UserId, id: &MealId) -> Result<(), BffError> {
      let mut tx = self.tx_manager.begin(user_id).await?;
      let deleted = self.meals.delete(&mut tx, user_id, id).await?;
      tx.commit().await?;

      ensure_deleted(deleted, ENTITY)
   }
}

#[cfg(test)]
mod tests {
   use chrono::{NaiveDate, TimeZone, Utc};
   use fitplan_domain::{clock::FixedClock, meal::MealType, value_objects::Title};
   use fitplan_infra::mock::{MockMealRepository, MockTransactionManager};
   use pretty_assertions::assert_eq;

   use super::*;

   fn sut(meals: &MockMealRepository) -> MealUseCaseImpl {
      MealUseCaseImpl::new(
         Arc::new(meals.clone()),
         Arc::new(MockTransactionManager::new()),
         Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
         )),
      )
   }

   fn oatmeal() -> NewMeal {
      let mut meal = NewMeal::planned(
         Title::new("Oatmeal").unwrap(),
         MealType::Breakfast,
         NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
      );
      meal.calories = Some(420);
      meal
   }

   #[tokio::test]
   async fn test_create_本人の食事として保存する() {
      let repo = MockMealRepository::new();
      let sut = sut(&repo);
      let user_id = UserId::new();

      let meal = sut.create(&user_id, oatmeal()).await.unwrap();

      assert_eq!(meal.user_id, user_id);
      assert_eq!(meal.calories, Some(420));
      assert!(!meal.completed);
      assert_eq!(repo.all(), vec![meal]);
   }

   #[tokio::test]
   async fn test_update_タイトルを変更できる() {
      let repo = MockMealRepository::new();
      let sut = sut(&repo);
      let user_id = UserId::new();
      let created = sut.create(&user_id, oatmeal()).await.unwrap();

      let updated = sut
         .update(
            &user_id,
            &created.id,
            ItemUpdate {
               title: Some(Title::new("Overnight Oats").unwrap()),
               ..Default::default()
            },
         )
         .await
         .unwrap();

      assert_eq!(updated.title, "Overnight Oats");
      assert_eq!(updated.calories, Some(420));
   }

   #[tokio::test]
   async fn test_delete_他ユーザーの行はnot_found() {
      let repo = MockMealRepository::new();
      let sut = sut(&repo);
      let created = sut.create(&UserId::new(), oatmeal()).await.unwrap();

      let err = sut.delete(&UserId::new(), &created.id).await.unwrap_err();

      assert!(matches!(err, BffError::NotFound(msg) if msg == "Meal not found"));
      assert_eq!(repo.all().len(), 1);
   }
}
