//! プロフィール・目標ユースケース

use std::sync::Arc;

use fitplan_domain::{
   clock::Clock,
   goal::{Goal, GoalId, NewGoal},
   profile::{Profile, ProfileUpdate},
   user::{Email, UserId},
};
use fitplan_infra::{
   db::TransactionManager,
   repository::{GoalRepository, ProfileRepository},
};

use crate::error::BffError;

/// プロフィール・目標ユースケース
pub struct ProfileUseCaseImpl {
   profiles:   Arc<dyn ProfileRepository>,
   goals:      Arc<dyn GoalRepository>,
   tx_manager: Arc<dyn TransactionManager>,
   clock:      Arc<dyn Clock>,
}

impl ProfileUseCaseImpl {
   pub fn new(
      profiles: Arc<dyn ProfileRepository>,
      goals: Arc<dyn GoalRepository>,
      tx_manager: Arc<dyn TransactionManager>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         profiles,
         goals,
         tx_manager,
         clock,
      }
   }

   /// 本人のプロフィールを取得する
   ///
   /// 初回アクセスでまだ行がなければ、検証済みのメールアドレスで作成する。
   pub async fn get_or_provision(
      &self,
      user_id: &UserId,
      email: &Email,
   ) -> Result<Profile, BffError> {
      if let Some(profile) = self.profiles.find_by_id(user_id).await? {
         return Ok(profile);
      }

      let profile = Profile::provision(user_id.clone(), email.clone(), self.clock.now());
      self.profiles.provision(&profile).await?;
      tracing::info!(user_id = %user_id, "プロフィールを初期作成しました");

      // 同時リクエストが先に作成していた場合はそちらを返す
      Ok(self
         .profiles
         .find_by_id(user_id)
         .await?
         .unwrap_or(profile))
   }

   /// プロフィールを部分更新する
   pub async fn update_profile(
      &self,
      user_id: &UserId,
      email: &Email,
      update: ProfileUpdate,
   ) -> Result<Profile, BffError> {
      let current = self.get_or_provision(user_id, email).await?;
      let profile = current.updated(update, self.clock.now())?;

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.profiles.update(&mut tx, &profile).await?;
      tx.commit().await?;

      Ok(profile)
   }

   pub async fn list_goals(&self, user_id: &UserId) -> Result<Vec<Goal>, BffError> {
      Ok(self.goals.find_all_by_user(user_id).await?)
   }

   pub async fn create_goal(&self, user_id: &UserId, input: NewGoal) -> Result<Goal, BffError> {
      let goal = input.into_goal(GoalId::new(), user_id.clone(), self.clock.now());

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.goals.insert(&mut tx, &goal).await?;
      tx.commit().await?;

      Ok(goal)
   }
}

#[cfg(test)]
mod tests {
   use chrono::{TimeZone, Utc};
   use fitplan_domain::{clock::FixedClock, goal::GoalType, profile::ActivityLevel};
   use fitplan_infra::mock::{MockGoalRepository, MockProfileRepository, MockTransactionManager};
   use pretty_assertions::assert_eq;

   use super::*;

   struct Fixture {
      profiles:   MockProfileRepository,
      goals:      MockGoalRepository,
      tx_manager: MockTransactionManager,
      sut:        ProfileUseCaseImpl,
   }

   fn fixture() -> Fixture {
      let profiles = MockProfileRepository::new();
      let goals = MockGoalRepository::new();
      let tx_manager = MockTransactionManager::new();
      let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
      let sut = ProfileUseCaseImpl::new(
         Arc::new(profiles.clone()),
         Arc::new(goals.clone()),
         Arc::new(tx_manager.clone()),
         Arc::new(clock),
      );
      Fixture {
         profiles,
         goals,
         tx_manager,
         sut,
      }
   }

   fn email() -> Email {
      Email::new("runner@example.com").unwrap()
   }

   #[tokio::test]
   async fn test_get_or_provision_未作成なら初期プロフィールを作成する() {
      let f = fixture();
      let user_id = UserId::new();

      let profile = f.sut.get_or_provision(&user_id, &email()).await.unwrap();

      assert_eq!(profile.id(), &user_id);
      assert_eq!(profile.email().as_str(), "runner@example.com");
      assert!(f.profiles.find_by_id(&user_id).await.unwrap().is_some());
   }

   #[tokio::test]
   async fn test_get_or_provision_既存のプロフィールはそのまま返す() {
      let f = fixture();
      let user_id = UserId::new();
      let existing = Profile::provision(user_id.clone(), email(), Utc::now())
         .updated(
            ProfileUpdate {
               age: Some(41),
               ..Default::default()
            },
            Utc::now(),
         )
         .unwrap();
      f.profiles.add_profile(existing);

      let profile = f.sut.get_or_provision(&user_id, &email()).await.unwrap();

      assert_eq!(profile.age(), Some(41));
   }

   #[tokio::test]
   async fn test_update_profile_指定したフィールドだけを更新する() {
      let f = fixture();
      let user_id = UserId::new();

      let profile = f
         .sut
         .update_profile(
            &user_id,
            &email(),
            ProfileUpdate {
               weight_kg: Some(68.5),
               activity_level: Some(ActivityLevel::Active),
               ..Default::default()
            },
         )
         .await
         .unwrap();

      assert_eq!(profile.weight_kg(), Some(68.5));
      assert_eq!(profile.activity_level(), Some(ActivityLevel::Active));
      assert_eq!(profile.age(), None);
      assert_eq!(f.tx_manager.begun(), 1);
      let stored = f.profiles.find_by_id(&user_id).await.unwrap().unwrap();
      assert_eq!(stored.weight_kg(), Some(68.5));
   }

   #[tokio::test]
   async fn test_create_goal_作成した目標が一覧に含まれる() {
      let f = fixture();
      let user_id = UserId::new();

      let goal = f
         .sut
         .create_goal(
            &user_id,
            NewGoal {
               goal_type:     GoalType::new("Lose Weight").unwrap(),
               target_value:  Some(65.0),
               current_value: Some(72.0),
               unit:          Some("kg".to_string()),
               deadline:      None,
            },
         )
         .await
         .unwrap();

      let goals = f.sut.list_goals(&user_id).await.unwrap();
      assert_eq!(goals, vec![goal]);
      assert_eq!(f.goals.find_all_by_user(&UserId::new()).await.unwrap(), vec![]);
   }
}
