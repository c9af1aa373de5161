//! ワークアウト生成ユースケース

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use fitplan_domain::{
   clock::Clock,
   generation::{
      ExerciseRecommendations,
      GeneratedWorkout,
      RecommendedExercise,
      WeeklyWorkoutPlan,
   },
   user::UserId,
   workout::{Workout, WorkoutId},
};
use fitplan_infra::{db::TransactionManager, repository::WorkoutRepository};
use fitplan_shared::{event_log::event, log_business_event};

use super::{
   generation::{GenerationError, Preferences, UserContextLoader, generate},
   prompt,
};
use crate::{client::LlmClient, error::BffError};

/// 生成時に参照する直近のワークアウト数
const RECENT_WORKOUTS: i64 = 5;

/// ワークアウト生成ユースケース
pub struct WorkoutGeneratorUseCaseImpl {
   context:    Arc<UserContextLoader>,
   workouts:   Arc<dyn WorkoutRepository>,
   llm:        Arc<dyn LlmClient>,
   tx_manager: Arc<dyn TransactionManager>,
   clock:      Arc<dyn Clock>,
}

impl WorkoutGeneratorUseCaseImpl {
   pub fn new(
      context: Arc<UserContextLoader>,
      workouts: Arc<dyn WorkoutRepository>,
      llm: Arc<dyn LlmClient>,
      tx_manager: Arc<dyn TransactionManager>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         context,
         workouts,
         llm,
         tx_manager,
         clock,
      }
   }

   /// プロフィール・目標・直近の履歴からワークアウトを 1 件生成する
   pub async fn generate(
      &self,
      user_id: &UserId,
      preferences: &Preferences,
   ) -> Result<GeneratedWorkout, BffError> {
      let context = self.context.load(user_id).await?;
      let recent = self.workouts.find_recent(user_id, RECENT_WORKOUTS).await?;

      let request = prompt::workout(&context, &recent, preferences);
      Ok(generate(self.llm.as_ref(), request).await?)
   }

   /// 生成して指定日に保存する
   pub async fn generate_and_save(
      &self,
      user_id: &UserId,
      preferences: &Preferences,
      scheduled_date: NaiveDate,
      scheduled_time: Option<NaiveTime>,
   ) -> Result<(Workout, GeneratedWorkout), BffError> {
      let generated = self.generate(user_id, preferences).await?;
      let workout = generated
         .to_new_workout(scheduled_date, scheduled_time, generated.saved_notes())
         .map_err(GenerationError::Artifact)?
         .into_workout(WorkoutId::new(), user_id.clone(), self.clock.now());

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.workouts.insert(&mut tx, &workout).await?;
      tx.commit().await?;

      log_business_event!(
         event.category = event::category::GENERATION,
         event.action = event::action::WORKOUT_SAVED,
         event.entity_type = event::entity_type::WORKOUT,
         event.entity_id = %workout.id,
         event.user_id = %user_id,
         event.result = event::result::SUCCESS,
         "生成したワークアウトを保存"
      );

      Ok((workout, generated))
   }

   /// 週間プランを生成する（保存しない）
   pub async fn weekly_plan(
      &self,
      user_id: &UserId,
      days_per_week: u8,
   ) -> Result<WeeklyWorkoutPlan, BffError> {
      let context = self.context.load(user_id).await?;
      let request = prompt::weekly_workout(&context, days_per_week);
      Ok(generate(self.llm.as_ref(), request).await?)
   }

   /// 週間プランを生成し、休養日以外を開始日から順に保存する
   pub async fn weekly_plan_and_save(
      &self,
      user_id: &UserId,
      days_per_week: u8,
      start_date: NaiveDate,
   ) -> Result<(WeeklyWorkoutPlan, Vec<Workout>), BffError> {
      let plan = self.weekly_plan(user_id, days_per_week).await?;
      let now = self.clock.now();

      let workouts = plan
         .plan
         .iter()
         .filter(|day| !day.is_rest())
         .map(|day| {
            day.to_new_workout(day.date_from(start_date), None)
               .map(|w| w.into_workout(WorkoutId::new(), user_id.clone(), now))
               .map_err(GenerationError::Artifact)
         })
         .collect::<Result<Vec<_>, _>>()?;

      let mut tx = self.tx_manager.begin(user_id).await?;
      for workout in &workouts {
         self.workouts.insert(&mut tx, workout).await?;
      }
      tx.commit().await?;

      tracing::info!(
         user_id = %user_id,
         saved = workouts.len(),
         "週間ワークアウトプランを保存しました"
      );

      Ok((plan, workouts))
   }

   /// 部位・器具を指定してエクササイズを推薦する
   pub async fn exercise_recommendations(
      &self,
      muscle_group: Option<&str>,
      equipment: Option<&str>,
   ) -> Result<Vec<RecommendedExercise>, BffError> {
      let request = prompt::exercise_recommendations(muscle_group, equipment);
      let recommendations: ExerciseRecommendations =
         generate(self.llm.as_ref(), request).await?;
      Ok(recommendations.exercises)
   }
}

#[cfg(test)]
mod tests {
   use chrono::NaiveTime;
   use pretty_assertions::assert_eq;

   use super::*;
   use crate::usecase::test_support::{MockRepos, StubLlm, clock};

   fn sut(repos: &MockRepos, llm: Arc<StubLlm>) -> WorkoutGeneratorUseCaseImpl {
      WorkoutGeneratorUseCaseImpl::new(
         repos.context_loader(),
         Arc::new(repos.workouts.clone()),
         llm,
         Arc::new(repos.tx_manager.clone()),
         clock(),
      )
   }

   fn date(day: u32) -> NaiveDate {
      NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
   }

   #[tokio::test]
   async fn test_generate_and_save_演習の要約をメモに保存する() {
      let repos = MockRepos::default();
      let sut = sut(&repos, Arc::new(StubLlm::new()));
      let user_id = UserId::new();
      let time = NaiveTime::from_hms_opt(18, 0, 0).unwrap();

      let (workout, generated) = sut
         .generate_and_save(&user_id, &Preferences::new(), date(3), Some(time))
         .await
         .unwrap();

      assert_eq!(workout.title, generated.title);
      assert_eq!(workout.scheduled_date, date(3));
      assert_eq!(workout.scheduled_time, Some(time));
      assert_eq!(
         workout.notes.as_deref(),
         Some(
            "Exercises:\n- Squat: 3x10-12\n- Push-up: 3x15\n\n\
             Warmup: 5 min jog\n\nCooldown: Stretch\n\nKeep the core tight"
         )
      );
      assert_eq!(repos.workouts.all(), vec![workout]);
   }

   #[tokio::test]
   async fn test_generate_直近の履歴をプロンプトに含める() {
      let repos = MockRepos::default();
      let llm = Arc::new(StubLlm::new());
      let sut = sut(&repos, llm.clone());
      let user_id = UserId::new();
      sut.generate_and_save(&user_id, &Preferences::new(), date(1), None)
         .await
         .unwrap();

      sut.generate(&user_id, &Preferences::new()).await.unwrap();

      let requests = llm.requests();
      assert!(requests[1].user.contains("\"title\": \"Full Body Strength\""));
   }

   #[tokio::test]
   async fn test_weekly_plan_and_save_休養日以外を開始日から保存する() {
      let repos = MockRepos::default();
      let sut = sut(&repos, Arc::new(StubLlm::new()));

      let (plan, saved) = sut
         .weekly_plan_and_save(&UserId::new(), 4, date(3))
         .await
         .unwrap();

      assert_eq!(plan.plan.len(), 7);
      let dates: Vec<_> = saved.iter().map(|w| w.scheduled_date).collect();
      assert_eq!(dates, vec![date(3), date(4), date(6), date(7)]);
      assert_eq!(saved[0].notes.as_deref(), Some("Focus: Chest and back"));
      assert_eq!(repos.workouts.all().len(), 4);
   }

   #[tokio::test]
   async fn test_generate_and_save_llmが失敗したら保存しない() {
      let repos = MockRepos::default();
      let sut = sut(&repos, Arc::new(StubLlm::failing()));

      let err = sut
         .generate_and_save(&UserId::new(), &Preferences::new(), date(1), None)
         .await
         .unwrap_err();

      assert!(matches!(err, BffError::Generation(GenerationError::Llm(_))));
      assert!(repos.workouts.all().is_empty());
   }

   #[tokio::test]
   async fn test_generate_and_save_空のタイトルは保存できない() {
      let repos = MockRepos::default();
      let mut body = crate::usecase::test_support::workout_json();
      body["title"] = "".into();
      let sut = sut(&repos, Arc::new(StubLlm::responding(&body.to_string())));

      let err = sut
         .generate_and_save(&UserId::new(), &Preferences::new(), date(1), None)
         .await
         .unwrap_err();

      assert!(matches!(
         err,
         BffError::Generation(GenerationError::Artifact(_))
      ));
   }

   #[tokio::test]
   async fn test_exercise_recommendations_推薦一覧を返す() {
      let repos = MockRepos::default();
      let sut = sut(&repos, Arc::new(StubLlm::new()));

      let exercises = sut
         .exercise_recommendations(Some("legs"), None)
         .await
         .unwrap();

      assert_eq!(exercises[0].name, "Goblet Squat");
   }
}
