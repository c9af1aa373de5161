//! # 生成プロンプト
//!
//! LLM に渡すシステムプロンプトとユーザーコンテキストを組み立てる。
//! 出力形式は各プロンプトに JSON の雛形として埋め込み、
//! 応答は [`fitplan_domain::generation`] の型で検証する。

use fitplan_domain::{
   dietary::join_or_none,
   meal::{Meal, MealType},
   profile::ActivityLevel,
   workout::Workout,
};
use itertools::Itertools;
use serde_json::{Value, json};

use super::generation::{Preferences, UserContext};
use crate::client::ChatRequest;

const WORKOUT_TEMPERATURE: f32 = 0.7;
const MEAL_TEMPERATURE: f32 = 0.8;
const NOT_SPECIFIED: &str = "Not specified";

const WORKOUT_SYSTEM: &str = r#"You are an expert fitness trainer and workout planner. Generate personalized, safe, and effective workouts based on user profiles and goals.

Return a JSON object with the following structure:
{
   "title": "Workout title",
   "description": "Brief description",
   "workout_type": "cardio|strength|flexibility|sports",
   "duration_minutes": 30-90,
   "intensity": "low|medium|high",
   "calories_burned": estimated calories,
   "exercises": [
      {
         "name": "Exercise name",
         "sets": 3,
         "reps": "10-12" or "duration in seconds",
         "rest_seconds": 60,
         "instructions": "How to perform",
         "tips": "Safety tips and form cues"
      }
   ],
   "warmup": "Warmup routine description",
   "cooldown": "Cooldown routine description",
   "notes": "Additional notes or modifications"
}

Consider:
- User's fitness level and goals
- Variety from recent workouts
- Safety and proper progression
- Equipment availability (assume basic home equipment)
- Time efficiency"#;

const WEEKLY_WORKOUT_SYSTEM: &str = r#"You are an expert fitness trainer creating weekly workout plans. Generate a balanced weekly plan with variety and proper recovery.

Return a JSON object with:
{
   "plan": [
      {
         "day": 1-7,
         "title": "Workout title",
         "workout_type": "cardio|strength|flexibility|sports|rest",
         "duration_minutes": 30-90,
         "intensity": "low|medium|high",
         "focus": "Main focus area",
         "description": "Brief description"
      }
   ],
   "notes": "Weekly plan notes and tips"
}

Ensure:
- Balanced muscle group targeting
- Adequate recovery days
- Progressive difficulty
- Variety to prevent boredom"#;

const EXERCISE_SYSTEM: &str = r#"You are a fitness expert. Provide exercise recommendations with proper form instructions.

Return a JSON object:
{
   "exercises": [
      {
         "name": "Exercise name",
         "difficulty": "beginner|intermediate|advanced",
         "muscle_groups": ["primary", "secondary"],
         "equipment": "required equipment",
         "instructions": "Step by step",
         "common_mistakes": "What to avoid",
         "modifications": "Easier/harder variations"
      }
   ]
}"#;

const MEAL_SYSTEM: &str = r#"You are an expert nutritionist and meal planner. Generate personalized, nutritious, and delicious meals based on user profiles, goals, and dietary restrictions.

Return a JSON object with the following structure:
{
   "title": "Meal name",
   "description": "Brief appetizing description",
   "meal_type": "breakfast|lunch|dinner|snack",
   "calories": total calories,
   "protein_g": protein in grams,
   "carbs_g": carbohydrates in grams,
   "fat_g": fat in grams,
   "fiber_g": fiber in grams,
   "ingredients": [
      {
         "name": "Ingredient name",
         "amount": "quantity",
         "unit": "g|ml|cup|tbsp|etc",
         "calories": calories from this ingredient
      }
   ],
   "instructions": [
      "Step 1",
      "Step 2",
      "..."
   ],
   "prep_time_minutes": preparation time,
   "cook_time_minutes": cooking time,
   "servings": number of servings,
   "tags": ["quick", "high-protein", "vegetarian", etc],
   "tips": "Cooking tips and variations",
   "nutrition_notes": "Why this meal supports their goals"
}

Consider:
- User's dietary restrictions and allergies (MUST comply)
- Nutritional goals and calorie targets
- Variety from recent meals
- Balanced macronutrients
- Practical and achievable recipes
- Seasonal and accessible ingredients"#;

const WEEKLY_MEAL_SYSTEM: &str = r#"You are an expert meal planner creating weekly meal plans. Generate a balanced, varied weekly plan.

Return a JSON object with:
{
   "weekly_plan": [
      {
         "day": 1-7,
         "day_name": "Monday",
         "breakfast": "Meal title",
         "lunch": "Meal title",
         "dinner": "Meal title",
         "snack": "Meal title",
         "theme": "Optional daily theme"
      }
   ],
   "shopping_list": {
      "produce": ["item1", "item2"],
      "proteins": ["item1", "item2"],
      "grains": ["item1", "item2"],
      "dairy": ["item1", "item2"],
      "pantry": ["item1", "item2"]
   },
   "meal_prep_tips": "Tips for preparing meals in advance",
   "notes": "Weekly plan notes"
}

Ensure:
- Variety throughout the week
- Balanced nutrition
- Practical meal prep
- Ingredient reuse to minimize waste"#;

const RECIPE_SYSTEM: &str = r#"You are a recipe expert. Provide recipe suggestions with clear instructions.

Return a JSON object:
{
   "recipes": [
      {
         "title": "Recipe name",
         "cuisine": "cuisine type",
         "difficulty": "easy|medium|hard",
         "prep_time": minutes,
         "cook_time": minutes,
         "servings": number,
         "calories_per_serving": calories,
         "description": "Brief description",
         "key_ingredients": ["ingredient1", "ingredient2"],
         "tags": ["quick", "healthy", etc]
      }
   ]
}"#;

fn pretty(value: &Value) -> String {
   serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn or_not_specified<T: ToString>(value: Option<T>) -> String {
   value.map_or_else(|| NOT_SPECIFIED.to_string(), |v| v.to_string())
}

fn activity_level(value: Option<ActivityLevel>) -> String {
   value.unwrap_or(ActivityLevel::Moderate).to_string()
}

fn goal_list(context: &UserContext) -> String {
   context.goals.iter().map(|g| &g.goal_type).join(", ")
}

/// ワークアウト生成
pub(crate) fn workout(
   context: &UserContext,
   recent: &[Workout],
   preferences: &Preferences,
) -> ChatRequest {
   let profile = context.profile.as_ref();
   let goals: Vec<Value> = context
      .goals
      .iter()
      .map(|g| json!({"type": g.goal_type, "target": g.target_value, "unit": g.unit}))
      .collect();
   let recent: Vec<Value> = recent
      .iter()
      .map(|w| json!({"title": w.title, "type": w.workout_type}))
      .collect();

   let body = format!(
      "User Profile:\n\
       - Age: {}\n\
       - Gender: {}\n\
       - Height: {} cm\n\
       - Weight: {} kg\n\
       - Activity Level: {}\n\n\
       Goals:\n{}\n\n\
       Recent Workouts (for variety):\n{}\n\n\
       Additional Preferences:\n{}",
      or_not_specified(profile.and_then(|p| p.age())),
      or_not_specified(profile.and_then(|p| p.gender())),
      or_not_specified(profile.and_then(|p| p.height_cm())),
      or_not_specified(profile.and_then(|p| p.weight_kg())),
      activity_level(profile.and_then(|p| p.activity_level())),
      pretty(&Value::Array(goals)),
      pretty(&Value::Array(recent)),
      pretty(&Value::Object(preferences.clone())),
   );

   ChatRequest {
      system:      WORKOUT_SYSTEM.to_string(),
      user:        format!("Generate a personalized workout for this user:\n\n{body}"),
      temperature: WORKOUT_TEMPERATURE,
   }
}

/// 週間ワークアウトプラン
pub(crate) fn weekly_workout(context: &UserContext, days_per_week: u8) -> ChatRequest {
   let profile = context.profile.as_ref();
   let body = format!(
      "User Profile:\n\
       - Age: {}\n\
       - Activity Level: {}\n\
       - Goals: {}\n\n\
       Days per week: {days_per_week}",
      or_not_specified(profile.and_then(|p| p.age())),
      activity_level(profile.and_then(|p| p.activity_level())),
      goal_list(context),
   );

   ChatRequest {
      system:      WEEKLY_WORKOUT_SYSTEM.to_string(),
      user:        format!("Generate a weekly workout plan:\n\n{body}"),
      temperature: WORKOUT_TEMPERATURE,
   }
}

/// エクササイズ推薦
pub(crate) fn exercise_recommendations(
   muscle_group: Option<&str>,
   equipment: Option<&str>,
) -> ChatRequest {
   let mut query = String::from("Recommend exercises");
   if let Some(muscle_group) = muscle_group {
      query.push_str(&format!(" for {muscle_group}"));
   }
   if let Some(equipment) = equipment {
      query.push_str(&format!(" using {equipment}"));
   }

   ChatRequest {
      system:      EXERCISE_SYSTEM.to_string(),
      user:        query,
      temperature: WORKOUT_TEMPERATURE,
   }
}

/// 食事生成
///
/// 1 食あたりの目標カロリーはプロフィールと目標から計算した値を埋め込む。
pub(crate) fn meal(
   context: &UserContext,
   meal_type: MealType,
   recent: &[Meal],
   preferences: &Preferences,
) -> ChatRequest {
   let metrics = context.body_metrics();
   let target = context.energy_target();
   let dietary = &context.dietary;
   let recent: Vec<Value> = recent
      .iter()
      .map(|m| json!({"title": m.title, "type": m.meal_type}))
      .collect();

   let body = format!(
      "User Profile:\n\
       - Weight: {} kg\n\
       - Height: {} cm\n\
       - Age: {}\n\
       - Activity Level: {}\n\
       - Daily Calorie Target: {} kcal\n\n\
       Goals: {}\n\n\
       Dietary Restrictions: {}\n\
       Allergies: {}\n\
       Preferences: {}\n\n\
       Meal Type: {meal_type}\n\
       Target Calories for this meal: {} kcal\n\n\
       Recent Meals (for variety):\n{}\n\n\
       Additional Preferences:\n{}",
      metrics.weight_kg,
      metrics.height_cm,
      metrics.age,
      activity_level(metrics.activity_level),
      target.daily_calories() as i64,
      goal_list(context),
      join_or_none(&dietary.restrictions),
      join_or_none(&dietary.allergies),
      join_or_none(&dietary.preferences),
      target.for_meal(meal_type),
      pretty(&Value::Array(recent)),
      pretty(&Value::Object(preferences.clone())),
   );

   ChatRequest {
      system:      MEAL_SYSTEM.to_string(),
      user:        format!("Generate a personalized {meal_type} for this user:\n\n{body}"),
      temperature: MEAL_TEMPERATURE,
   }
}

/// 週間食事プラン
pub(crate) fn weekly_meal(context: &UserContext) -> ChatRequest {
   let body = format!(
      "User Profile:\n\
       - Goals: {}\n\
       - Dietary Restrictions: {}\n\
       - Activity Level: {}",
      goal_list(context),
      join_or_none(&context.dietary.restrictions),
      activity_level(context.profile.as_ref().and_then(|p| p.activity_level())),
   );

   ChatRequest {
      system:      WEEKLY_MEAL_SYSTEM.to_string(),
      user:        format!("Generate a weekly meal plan:\n\n{body}"),
      temperature: MEAL_TEMPERATURE,
   }
}

/// レシピ提案（制限・アレルギーは検索条件に含める）
pub(crate) fn recipe_suggestions(
   context: &UserContext,
   cuisine: Option<&str>,
   max_time: Option<u32>,
) -> ChatRequest {
   let mut query = String::from("Suggest recipes");
   if let Some(cuisine) = cuisine {
      query.push_str(&format!(" from {cuisine} cuisine"));
   }
   if let Some(max_time) = max_time {
      query.push_str(&format!(" that can be made in under {max_time} minutes"));
   }
   let restrictions = context.dietary.restrictions_and_allergies();
   if !restrictions.is_empty() {
      query.push_str(&format!(" that are {}", restrictions.join(", ")));
   }

   ChatRequest {
      system:      RECIPE_SYSTEM.to_string(),
      user:        query,
      temperature: MEAL_TEMPERATURE,
   }
}

#[cfg(test)]
mod tests {
   use chrono::Utc;
   use fitplan_domain::{
      dietary::DietaryProfile,
      goal::{Goal, GoalId, GoalType, NewGoal},
      profile::{Gender, Profile, ProfileUpdate},
      user::{Email, UserId},
   };
   use pretty_assertions::assert_eq;

   use super::*;

   fn goal(goal_type: &str) -> Goal {
      NewGoal {
         goal_type:     GoalType::new(goal_type).unwrap(),
         target_value:  None,
         current_value: None,
         unit:          None,
         deadline:      None,
      }
      .into_goal(GoalId::new(), UserId::new(), Utc::now())
   }

   fn profile() -> Profile {
      Profile::provision(
         UserId::new(),
         Email::new("runner@example.com").unwrap(),
         Utc::now(),
      )
      .updated(
         ProfileUpdate {
            age: Some(35),
            gender: Some(Gender::Female),
            weight_kg: Some(62.5),
            height_cm: Some(165),
            ..Default::default()
         },
         Utc::now(),
      )
      .unwrap()
   }

   #[test]
   fn test_workout_未設定のプロフィール項目はnot_specifiedになる() {
      let context = UserContext::default();

      let request = workout(&context, &[], &Preferences::new());

      assert!(request.user.starts_with("Generate a personalized workout for this user:\n\n"));
      assert!(request.user.contains("- Age: Not specified\n"));
      assert!(request.user.contains("- Activity Level: moderate\n"));
      assert!(request.user.ends_with("Additional Preferences:\n{}"));
      assert_eq!(request.temperature, 0.7);
   }

   #[test]
   fn test_workout_プロフィールと追加条件を埋め込む() {
      let context = UserContext {
         profile: Some(profile()),
         ..Default::default()
      };
      let mut preferences = Preferences::new();
      preferences.insert("scheduled_date".into(), json!("2025-03-01"));

      let request = workout(&context, &[], &preferences);

      assert!(request.user.contains("- Gender: female\n"));
      assert!(request.user.contains("- Weight: 62.5 kg\n"));
      assert!(request.user.contains("\"scheduled_date\": \"2025-03-01\""));
   }

   #[test]
   fn test_weekly_workout_目標をカンマ区切りで並べる() {
      let context = UserContext {
         goals: vec![goal("Lose Weight"), goal("Run a 10K")],
         ..Default::default()
      };

      let request = weekly_workout(&context, 3);

      assert!(request.user.contains("- Goals: Lose Weight, Run a 10K\n"));
      assert!(request.user.ends_with("Days per week: 3"));
   }

   #[test]
   fn test_meal_既定値で計算した目標カロリーを埋め込む() {
      let context = UserContext::default();

      let request = meal(&context, MealType::Lunch, &[], &Preferences::new());

      // BMR 1617.5 × 1.55 = 2507.125、昼食は 35%
      assert!(request.user.contains("- Daily Calorie Target: 2507 kcal\n"));
      assert!(request.user.contains("Target Calories for this meal: 877 kcal\n"));
      assert!(request.user.contains("Dietary Restrictions: None\n"));
      assert!(request.user.starts_with("Generate a personalized lunch for this user:"));
      assert_eq!(request.temperature, 0.8);
   }

   #[test]
   fn test_recipe_suggestions_制限とアレルギーを条件に加える() {
      let context = UserContext {
         dietary: DietaryProfile {
            restrictions: vec!["vegetarian".into()],
            allergies:    vec!["peanut-free".into()],
            preferences:  vec!["spicy".into()],
         },
         ..Default::default()
      };

      let request = recipe_suggestions(&context, Some("Thai"), Some(30));

      assert_eq!(
         request.user,
         "Suggest recipes from Thai cuisine that can be made in under 30 minutes \
          that are vegetarian, peanut-free"
      );
   }

   #[test]
   fn test_exercise_recommendations_条件がなければ汎用の依頼になる() {
      assert_eq!(exercise_recommendations(None, None).user, "Recommend exercises");
      assert_eq!(
         exercise_recommendations(Some("legs"), Some("dumbbells")).user,
         "Recommend exercises for legs using dumbbells"
      );
   }
}
