//! 食事プラン生成ユースケース

use std::{collections::BTreeMap, sync::Arc};

use chrono::{NaiveDate, NaiveTime};
use fitplan_domain::{
   clock::Clock,
   generation::{DailyMealPlan, GeneratedMeal, Recipe, RecipeSuggestions, WeeklyMealPlan},
   meal::{Meal, MealId, MealType},
   user::UserId,
};
use fitplan_infra::{db::TransactionManager, repository::MealRepository};
use fitplan_shared::{event_log::event, log_business_event};

use super::{
   generation::{GenerationError, Preferences, UserContext, UserContextLoader, generate},
   prompt,
};
use crate::{client::LlmClient, error::BffError};

/// 生成時に参照する直近の食事数
const RECENT_MEALS: i64 = 7;

/// 食事プラン生成ユースケース
pub struct MealPlannerUseCaseImpl {
   context:    Arc<UserContextLoader>,
   meals:      Arc<dyn MealRepository>,
   llm:        Arc<dyn LlmClient>,
   tx_manager: Arc<dyn TransactionManager>,
   clock:      Arc<dyn Clock>,
}

impl MealPlannerUseCaseImpl {
   pub fn new(
      context: Arc<UserContextLoader>,
      meals: Arc<dyn MealRepository>,
      llm: Arc<dyn LlmClient>,
      tx_manager: Arc<dyn TransactionManager>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         context,
         meals,
         llm,
         tx_manager,
         clock,
      }
   }

   async fn generate_with(
      &self,
      context: &UserContext,
      recent: &[Meal],
      meal_type: MealType,
      preferences: &Preferences,
   ) -> Result<GeneratedMeal, BffError> {
      let request = prompt::meal(context, meal_type, recent, preferences);
      Ok(generate(self.llm.as_ref(), request).await?)
   }

   /// 食事区分の目標カロリーに合わせて 1 食生成する
   pub async fn generate(
      &self,
      user_id: &UserId,
      meal_type: MealType,
      preferences: &Preferences,
   ) -> Result<GeneratedMeal, BffError> {
      let context = self.context.load(user_id).await?;
      let recent = self.meals.find_recent(user_id, RECENT_MEALS).await?;
      self.generate_with(&context, &recent, meal_type, preferences)
         .await
   }

   /// 生成して指定日に保存する
   pub async fn generate_and_save(
      &self,
      user_id: &UserId,
      meal_type: MealType,
      preferences: &Preferences,
      scheduled_date: NaiveDate,
      scheduled_time: Option<NaiveTime>,
   ) -> Result<(Meal, GeneratedMeal), BffError> {
      let generated = self.generate(user_id, meal_type, preferences).await?;
      let meal = generated
         .to_new_meal(
            meal_type,
            scheduled_date,
            scheduled_time,
            generated.saved_notes(),
         )
         .map_err(GenerationError::Artifact)?
         .into_meal(MealId::new(), user_id.clone(), self.clock.now());

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.meals.insert(&mut tx, &meal).await?;
      tx.commit().await?;

      log_business_event!(
         event.category = event::category::GENERATION,
         event.action = event::action::MEAL_SAVED,
         event.entity_type = event::entity_type::MEAL,
         event.entity_id = %meal.id,
         event.user_id = %user_id,
         event.result = event::result::SUCCESS,
         "生成した食事を保存"
      );

      Ok((meal, generated))
   }

   /// 4 区分の食事を順に生成し、1 日の合計を付ける
   ///
   /// 保存はしない。
   pub async fn daily_plan(
      &self,
      user_id: &UserId,
      date: NaiveDate,
   ) -> Result<DailyMealPlan, BffError> {
      let context = self.context.load(user_id).await?;
      let recent = self.meals.find_recent(user_id, RECENT_MEALS).await?;

      let mut meals = BTreeMap::new();
      for meal_type in MealType::ALL {
         let meal = self
            .generate_with(&context, &recent, meal_type, &Preferences::new())
            .await?;
         meals.insert(meal_type, meal);
      }

      Ok(DailyMealPlan::new(date, meals))
   }

   /// 週間の献立と買い物リストを 1 回の呼び出しで生成する
   pub async fn weekly_plan(&self, user_id: &UserId) -> Result<WeeklyMealPlan, BffError> {
      let context = self.context.load(user_id).await?;
      let request = prompt::weekly_meal(&context);
      Ok(generate(self.llm.as_ref(), request).await?)
   }

   pub async fn recipe_suggestions(
      &self,
      user_id: &UserId,
      cuisine: Option<&str>,
      max_time: Option<u32>,
   ) -> Result<Vec<Recipe>, BffError> {
      let context = self.context.load(user_id).await?;
      let request = prompt::recipe_suggestions(&context, cuisine, max_time);
      let suggestions: RecipeSuggestions = generate(self.llm.as_ref(), request).await?;
      Ok(suggestions.recipes)
   }
}

#[cfg(test)]
mod tests {
   use chrono::Utc;
   use fitplan_domain::{
      dietary::{DietaryPreference, DietaryPreferenceId, PreferenceKind},
      goal::{GoalId, GoalType, NewGoal},
   };
   use pretty_assertions::assert_eq;

   use super::*;
   use crate::usecase::test_support::{MockRepos, StubLlm, clock};

   fn sut(repos: &MockRepos, llm: Arc<StubLlm>) -> MealPlannerUseCaseImpl {
      MealPlannerUseCaseImpl::new(
         repos.context_loader(),
         Arc::new(repos.meals.clone()),
         llm,
         Arc::new(repos.tx_manager.clone()),
         clock(),
      )
   }

   fn date() -> NaiveDate {
      NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
   }

   #[tokio::test]
   async fn test_daily_plan_4区分を順に生成して合計する() {
      let repos = MockRepos::default();
      let llm = Arc::new(StubLlm::new());
      let sut = sut(&repos, llm.clone());

      let plan = sut.daily_plan(&UserId::new(), date()).await.unwrap();

      let order: Vec<_> = llm
         .requests()
         .iter()
         .map(|r| r.user.lines().next().unwrap_or_default().to_string())
         .collect();
      assert_eq!(
         order,
         vec![
            "Generate a personalized breakfast for this user:",
            "Generate a personalized lunch for this user:",
            "Generate a personalized dinner for this user:",
            "Generate a personalized snack for this user:",
         ]
      );
      assert_eq!(plan.meals.len(), 4);
      assert_eq!(plan.daily_totals.calories, 2000);
      assert_eq!(plan.daily_totals.protein_g, 128.0);
   }

   #[tokio::test]
   async fn test_generate_減量目標があると目標カロリーを下げる() {
      let repos = MockRepos::default();
      let user_id = UserId::new();
      repos.goals.add_goal(
         NewGoal {
            goal_type:     GoalType::new("Lose Weight").unwrap(),
            target_value:  Some(65.0),
            current_value: None,
            unit:          Some("kg".to_string()),
            deadline:      None,
         }
         .into_goal(GoalId::new(), user_id.clone(), Utc::now()),
      );
      let llm = Arc::new(StubLlm::new());
      let sut = sut(&repos, llm.clone());

      sut.generate(&user_id, MealType::Breakfast, &Preferences::new())
         .await
         .unwrap();

      // 2507.125 × 0.85 = 2131.05625、朝食は 25%
      let prompt = &llm.requests()[0].user;
      assert!(prompt.contains("- Daily Calorie Target: 2131 kcal\n"));
      assert!(prompt.contains("Target Calories for this meal: 532 kcal\n"));
   }

   #[tokio::test]
   async fn test_generate_and_save_要求した区分で保存する() {
      let repos = MockRepos::default();
      let sut = sut(&repos, Arc::new(StubLlm::new()));
      let user_id = UserId::new();

      let (meal, generated) = sut
         .generate_and_save(&user_id, MealType::Dinner, &Preferences::new(), date(), None)
         .await
         .unwrap();

      assert_eq!(meal.meal_type, MealType::Dinner);
      assert_eq!(meal.calories, Some(generated.calories));
      assert_eq!(
         meal.notes.as_deref(),
         Some("Prep: 10min | Cook: 15min\n\nInstructions:\n1. Prepare\n2. Serve\n\nTips: Season to taste")
      );
      assert_eq!(repos.meals.all(), vec![meal]);
   }

   #[tokio::test]
   async fn test_recipe_suggestions_アレルギーを検索条件に含める() {
      let repos = MockRepos::default();
      let user_id = UserId::new();
      repos.dietary.add_preference(DietaryPreference {
         id:      DietaryPreferenceId::new(),
         user_id: user_id.clone(),
         kind:    PreferenceKind::Allergy,
         value:   "gluten-free".to_string(),
      });
      let llm = Arc::new(StubLlm::new());
      let sut = sut(&repos, llm.clone());

      let recipes = sut.recipe_suggestions(&user_id, None, Some(20)).await.unwrap();

      assert_eq!(recipes[0].prep_time, Some(15));
      assert_eq!(
         llm.requests()[0].user,
         "Suggest recipes that can be made in under 20 minutes that are gluten-free"
      );
   }

   #[tokio::test]
   async fn test_weekly_plan_買い物リストを含む() {
      let repos = MockRepos::default();
      let sut = sut(&repos, Arc::new(StubLlm::new()));

      let plan = sut.weekly_plan(&UserId::new()).await.unwrap();

      assert_eq!(plan.shopping_list["produce"], vec!["spinach"]);
      assert_eq!(plan.meal_prep_tips.as_deref(), Some("Batch cook grains"));
   }
}
