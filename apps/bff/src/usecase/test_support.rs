//! ユースケーステスト用のスタブとフィクスチャ

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fitplan_domain::{clock::FixedClock, meal::MealType};
use fitplan_infra::mock::{
   MockDietaryPreferenceRepository,
   MockGoalRepository,
   MockMealRepository,
   MockProfileRepository,
   MockScheduleGenerationRepository,
   MockTransactionManager,
   MockWorkoutRepository,
};
use serde_json::{Value, json};

use super::generation::UserContextLoader;
use crate::client::{ChatRequest, LlmClient, LlmError};

/// テストの基準時刻（2025-03-01 09:00 UTC）
pub(crate) fn clock() -> Arc<FixedClock> {
   Arc::new(FixedClock::new(
      Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
   ))
}

// ===== LLM スタブ =====

enum Reply {
   ByPrompt,
   Fixed(String),
   Fail,
}

/// システムプロンプトの内容に応じて定型の JSON を返す LLM
pub(crate) struct StubLlm {
   reply:    Reply,
   requests: Mutex<Vec<ChatRequest>>,
}

impl StubLlm {
   pub(crate) fn new() -> Self {
      Self::with(Reply::ByPrompt)
   }

   /// 常に同じ本文を返す
   pub(crate) fn responding(content: &str) -> Self {
      Self::with(Reply::Fixed(content.to_string()))
   }

   /// 常に失敗する
   pub(crate) fn failing() -> Self {
      Self::with(Reply::Fail)
   }

   fn with(reply: Reply) -> Self {
      Self {
         reply,
         requests: Mutex::new(Vec::new()),
      }
   }

   pub(crate) fn requests(&self) -> Vec<ChatRequest> {
      self.requests.lock().unwrap().clone()
   }
}

#[async_trait]
impl LlmClient for StubLlm {
   async fn complete_json(&self, request: ChatRequest) -> Result<String, LlmError> {
      self.requests.lock().unwrap().push(request.clone());
      match &self.reply {
         Reply::Fixed(content) => Ok(content.clone()),
         Reply::Fail => Err(LlmError::Status {
            status: 503,
            body:   "unavailable".to_string(),
         }),
         Reply::ByPrompt => Ok(reply_for(&request).to_string()),
      }
   }
}

fn reply_for(request: &ChatRequest) -> Value {
   let system = request.system.as_str();
   if system.contains("workout planner") {
      workout_json()
   } else if system.contains("weekly workout plans") {
      weekly_workout_json()
   } else if system.contains("exercise recommendations") {
      json!({"exercises": [{"name": "Goblet Squat", "muscle_groups": ["legs"]}]})
   } else if system.contains("nutritionist") {
      let meal_type = MealType::ALL
         .into_iter()
         .find(|t| {
            request
               .user
               .starts_with(&format!("Generate a personalized {t} "))
         })
         .unwrap_or(MealType::Lunch);
      meal_json(meal_type)
   } else if system.contains("weekly meal plans") {
      weekly_meal_json()
   } else if system.contains("recipe expert") {
      json!({"recipes": [{"title": "Pad Krapow", "cuisine": "Thai", "prep_time": "15"}]})
   } else {
      json!({})
   }
}

pub(crate) fn workout_json() -> Value {
   json!({
      "title": "Full Body Strength",
      "description": "Compound lifts for the whole body",
      "workout_type": "strength",
      "duration_minutes": 45,
      "intensity": "medium",
      "calories_burned": 320,
      "exercises": [
         {"name": "Squat", "sets": 3, "reps": "10-12", "rest_seconds": 60},
         {"name": "Push-up", "sets": 3, "reps": 15}
      ],
      "warmup": "5 min jog",
      "cooldown": "Stretch",
      "notes": "Keep the core tight"
   })
}

pub(crate) fn weekly_workout_json() -> Value {
   json!({
      "plan": [
         {"day": 1, "title": "Upper Body", "workout_type": "strength", "duration_minutes": 45, "intensity": "medium", "focus": "Chest and back"},
         {"day": 2, "title": "Easy Run", "workout_type": "cardio", "duration_minutes": 30, "intensity": "low", "focus": "Aerobic base"},
         {"day": 3, "title": "Rest", "workout_type": "rest"},
         {"day": 4, "title": "Lower Body", "workout_type": "strength", "duration_minutes": 50, "intensity": "high", "focus": "Legs"},
         {"day": 5, "title": "Yoga Flow", "workout_type": "flexibility", "duration_minutes": 30, "intensity": "low", "focus": "Mobility"},
         {"day": 6, "title": "Rest", "workout_type": "rest"},
         {"day": 7, "title": "Rest", "workout_type": "rest"}
      ],
      "notes": "Stay hydrated"
   })
}

/// 区分ごとに異なる栄養値の食事（合計 2000 kcal）
pub(crate) fn meal_json(meal_type: MealType) -> Value {
   let (title, calories, protein, carbs, fat) = match meal_type {
      MealType::Breakfast => ("Greek Yogurt Bowl", 450, 30.0, 50.0, 12.0),
      MealType::Lunch => ("Chicken Rice Bowl", 650, 45.0, 70.0, 18.0),
      MealType::Dinner => ("Salmon with Quinoa", 700, 48.0, 60.0, 25.0),
      MealType::Snack => ("Apple and Almonds", 200, 5.0, 20.0, 11.0),
   };
   json!({
      "title": title,
      "description": format!("A balanced {meal_type}"),
      "meal_type": meal_type,
      "calories": calories,
      "protein_g": protein,
      "carbs_g": carbs,
      "fat_g": fat,
      "ingredients": [{"name": "Base", "amount": 1, "unit": "cup"}],
      "instructions": ["Prepare", "Serve"],
      "prep_time_minutes": 10,
      "cook_time_minutes": 15,
      "tips": "Season to taste"
   })
}

pub(crate) fn weekly_meal_json() -> Value {
   json!({
      "weekly_plan": [
         {"day": 1, "day_name": "Saturday", "breakfast": "Oats", "lunch": "Wrap", "dinner": "Curry", "snack": "Fruit"}
      ],
      "shopping_list": {"produce": ["spinach"], "proteins": ["chicken"]},
      "meal_prep_tips": "Batch cook grains"
   })
}

// ===== リポジトリ一式 =====

/// 生成系ユースケースが使うモックリポジトリ一式
#[derive(Clone, Default)]
pub(crate) struct MockRepos {
   pub profiles:   MockProfileRepository,
   pub goals:      MockGoalRepository,
   pub dietary:    MockDietaryPreferenceRepository,
   pub workouts:   MockWorkoutRepository,
   pub meals:      MockMealRepository,
   pub schedules:  MockScheduleGenerationRepository,
   pub tx_manager: MockTransactionManager,
}

impl MockRepos {
   pub(crate) fn context_loader(&self) -> Arc<UserContextLoader> {
      Arc::new(UserContextLoader::new(
         Arc::new(self.profiles.clone()),
         Arc::new(self.goals.clone()),
         Arc::new(self.dietary.clone()),
      ))
   }
}
