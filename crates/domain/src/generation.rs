//! # 生成結果スキーマ
//!
//! LLM が返す JSON を、受け取った直後に型付き構造体へ変換する。
//! 以降の処理（保存、メモ生成、栄養集計）は型付きの値だけを扱い、
//! 必須フィールドの欠落は [`GenerationSchemaError::MissingField`] として呼び出し元に返る。
//!
//! 数値フィールドは `45`、`45.0`、`"45"` のいずれも受け付ける（LLM の揺れを吸収する）。
//!
//! ```rust
//! use fitplan_domain::generation::{GeneratedWorkout, GenerationSchemaError, parse_artifact};
//!
//! let result = parse_artifact::<GeneratedWorkout>(r#"{"title": "Run"}"#);
//! assert!(matches!(
//!     result,
//!     Err(GenerationSchemaError::MissingField { field: "description", .. })
//! ));
//! ```

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{
   DomainError,
   meal::{MealType, NewMeal},
   nutrition::NutritionTotals,
   value_objects::Title,
   workout::{NewWorkout, workout_type},
};

/// 生成結果の検証エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationSchemaError {
   #[error("生成結果が JSON として不正です: {0}")]
   InvalidJson(String),

   #[error("{artifact} の生成結果が JSON オブジェクトではありません")]
   NotAnObject { artifact: &'static str },

   #[error("{artifact} の生成結果に必須フィールド {field} がありません")]
   MissingField {
      artifact: &'static str,
      field:    &'static str,
   },

   #[error("{artifact} の生成結果が不正です: {message}")]
   InvalidField {
      artifact: &'static str,
      message:  String,
   },
}

/// LLM が生成する成果物
pub trait GeneratedArtifact: DeserializeOwned {
   /// エラーメッセージ用の名前
   const NAME: &'static str;

   /// 値が `null` でも欠落とみなすフィールド
   const REQUIRED_FIELDS: &'static [&'static str];

   /// 構造以外の検証（範囲チェックなど）
   fn validate(&self) -> Result<(), GenerationSchemaError> {
      Ok(())
   }
}

/// LLM の応答本文を成果物に変換する
pub fn parse_artifact<T: GeneratedArtifact>(content: &str) -> Result<T, GenerationSchemaError> {
   let value: serde_json::Value = serde_json::from_str(content)
      .map_err(|e| GenerationSchemaError::InvalidJson(e.to_string()))?;

   let object = value
      .as_object()
      .ok_or(GenerationSchemaError::NotAnObject { artifact: T::NAME })?;

   if let Some(field) = T::REQUIRED_FIELDS
      .iter()
      .copied()
      .find(|f| object.get(*f).is_none_or(serde_json::Value::is_null))
   {
      return Err(GenerationSchemaError::MissingField {
         artifact: T::NAME,
         field,
      });
   }

   let artifact: T =
      serde_json::from_value(value).map_err(|e| GenerationSchemaError::InvalidField {
         artifact: T::NAME,
         message:  e.to_string(),
      })?;
   artifact.validate()?;
   Ok(artifact)
}

/// 数値フィールドの寛容なデシリアライザ
mod lenient {
   use serde::{Deserialize, Deserializer, de::Error};

   #[derive(Deserialize)]
   #[serde(untagged)]
   enum Numeric {
      Int(i64),
      Float(f64),
      Text(String),
   }

   impl Numeric {
      fn to_i32(&self) -> Option<i32> {
         let n = match self {
            Self::Int(n) => *n,
            Self::Float(f) if f.is_finite() => f.trunc() as i64,
            Self::Float(_) => return None,
            Self::Text(s) => {
               let s = s.trim();
               s.parse::<i64>()
                  .ok()
                  .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))?
            }
         };
         i32::try_from(n).ok()
      }
   }

   pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
      let raw = Numeric::deserialize(deserializer)?;
      raw.to_i32()
         .ok_or_else(|| D::Error::custom("expected an integer"))
   }

   pub fn opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
      let raw = Option::<Numeric>::deserialize(deserializer)?;
      match raw {
         None => Ok(None),
         Some(Numeric::Text(s)) if s.trim().is_empty() => Ok(None),
         Some(n) => n
            .to_i32()
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected an integer")),
      }
   }
}

/// 数値または文字列の量（回数 `12`、範囲 `"10-12"`、分量 `"1/2"` など）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Quantity {
   Number(f64),
   Text(String),
}

impl std::fmt::Display for Quantity {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      match self {
         Self::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
         Self::Number(n) => write!(f, "{n}"),
         Self::Text(s) => f.write_str(s),
      }
   }
}

fn or_empty(value: &Option<String>) -> &str {
   value.as_deref().unwrap_or_default()
}

fn numbered_steps(steps: &[String]) -> String {
   steps
      .iter()
      .enumerate()
      .map(|(i, step)| format!("{}. {step}", i + 1))
      .collect::<Vec<_>>()
      .join("\n")
}

// =========================================================================
// ワークアウト
// =========================================================================

/// 生成されたエクササイズ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Exercise {
   pub name:         String,
   #[serde(default, deserialize_with = "lenient::opt_int")]
   pub sets:         Option<i32>,
   #[serde(default)]
   pub reps:         Option<Quantity>,
   #[serde(default, deserialize_with = "lenient::opt_int")]
   pub rest_seconds: Option<i32>,
   #[serde(default)]
   pub instructions: Option<String>,
   #[serde(default)]
   pub tips:         Option<String>,
}

impl Exercise {
   /// `- name: SxR` 形式の 1 行
   pub fn summary_line(&self) -> String {
      let sets = self.sets.map(|s| s.to_string()).unwrap_or_default();
      let reps = self.reps.as_ref().map(ToString::to_string).unwrap_or_default();
      format!("- {}: {sets}x{reps}", self.name)
   }
}

/// 生成されたワークアウト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GeneratedWorkout {
   pub title:            String,
   pub description:      String,
   pub workout_type:     String,
   #[serde(deserialize_with = "lenient::int")]
   pub duration_minutes: i32,
   pub intensity:        String,
   #[serde(default, deserialize_with = "lenient::opt_int")]
   pub calories_burned:  Option<i32>,
   #[serde(default)]
   pub exercises:        Vec<Exercise>,
   #[serde(default)]
   pub warmup:           Option<String>,
   #[serde(default)]
   pub cooldown:         Option<String>,
   #[serde(default)]
   pub notes:            Option<String>,
}

impl GeneratedArtifact for GeneratedWorkout {
   const NAME: &'static str = "workout";
   const REQUIRED_FIELDS: &'static [&'static str] = &[
      "title",
      "description",
      "workout_type",
      "duration_minutes",
      "intensity",
   ];
}

impl GeneratedWorkout {
   fn exercise_lines(&self) -> String {
      self.exercises
         .iter()
         .map(Exercise::summary_line)
         .collect::<Vec<_>>()
         .join("\n")
   }

   /// 単発保存時のメモ
   pub fn saved_notes(&self) -> String {
      format!(
         "Exercises:\n{}\n\nWarmup: {}\n\nCooldown: {}\n\n{}",
         self.exercise_lines(),
         or_empty(&self.warmup),
         or_empty(&self.cooldown),
         or_empty(&self.notes),
      )
   }

   /// 日次スケジュール保存時のメモ
   pub fn scheduled_notes(&self) -> String {
      format!("AI Generated\n\nExercises:\n{}", self.exercise_lines())
   }

   /// 保存用の作成入力に変換する
   pub fn to_new_workout(
      &self,
      scheduled_date: NaiveDate,
      scheduled_time: Option<NaiveTime>,
      notes: String,
   ) -> Result<NewWorkout, DomainError> {
      let mut workout = NewWorkout::planned(
         Title::new(&self.title)?,
         &self.workout_type,
         scheduled_date,
      );
      workout.description = Some(self.description.clone());
      workout.duration_minutes = Some(self.duration_minutes);
      workout.calories_burned = self.calories_burned;
      workout.intensity = Some(self.intensity.clone());
      workout.scheduled_time = scheduled_time;
      workout.notes = Some(notes);
      Ok(workout)
   }
}

/// 週間プランの 1 日分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlannedWorkoutDay {
   /// 1（開始日）〜 7
   #[serde(deserialize_with = "lenient::int")]
   pub day:              i32,
   pub title:            String,
   /// `rest` は休養日
   pub workout_type:     String,
   #[serde(default, deserialize_with = "lenient::opt_int")]
   pub duration_minutes: Option<i32>,
   #[serde(default)]
   pub intensity:        Option<String>,
   #[serde(default)]
   pub focus:            Option<String>,
   #[serde(default)]
   pub description:      Option<String>,
}

impl PlannedWorkoutDay {
   pub fn is_rest(&self) -> bool {
      self.workout_type.eq_ignore_ascii_case(workout_type::REST)
   }

   /// 開始日から数えたこの日の日付
   pub fn date_from(&self, start_date: NaiveDate) -> NaiveDate {
      start_date + chrono::Days::new(u64::try_from(self.day - 1).unwrap_or_default())
   }

   pub fn focus_notes(&self) -> String {
      format!("Focus: {}", or_empty(&self.focus))
   }

   pub fn to_new_workout(
      &self,
      scheduled_date: NaiveDate,
      scheduled_time: Option<NaiveTime>,
   ) -> Result<NewWorkout, DomainError> {
      let mut workout = NewWorkout::planned(
         Title::new(&self.title)?,
         &self.workout_type,
         scheduled_date,
      );
      workout.description = self.description.clone();
      workout.duration_minutes = self.duration_minutes;
      workout.intensity = self.intensity.clone();
      workout.scheduled_time = scheduled_time;
      workout.notes = Some(self.focus_notes());
      Ok(workout)
   }
}

/// 生成された週間ワークアウトプラン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WeeklyWorkoutPlan {
   pub plan:  Vec<PlannedWorkoutDay>,
   #[serde(default)]
   pub notes: Option<String>,
}

impl GeneratedArtifact for WeeklyWorkoutPlan {
   const NAME: &'static str = "weekly_workout_plan";
   const REQUIRED_FIELDS: &'static [&'static str] = &["plan"];

   fn validate(&self) -> Result<(), GenerationSchemaError> {
      if let Some(day) = self.plan.iter().find(|d| !(1..=7).contains(&d.day)) {
         return Err(GenerationSchemaError::InvalidField {
            artifact: Self::NAME,
            message:  format!("day は 1〜7 である必要があります: {}", day.day),
         });
      }
      Ok(())
   }
}

impl WeeklyWorkoutPlan {
   /// 指定日（1〜7）の運動日。休養日と未定義の日は `None`
   pub fn workout_for_day(&self, day: i32) -> Option<&PlannedWorkoutDay> {
      self.plan.iter().find(|d| d.day == day && !d.is_rest())
   }
}

/// 推薦エクササイズ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecommendedExercise {
   pub name:            String,
   #[serde(default)]
   pub difficulty:      Option<String>,
   #[serde(default)]
   pub muscle_groups:   Vec<String>,
   #[serde(default)]
   pub equipment:       Option<String>,
   #[serde(default)]
   pub instructions:    Option<String>,
   #[serde(default)]
   pub common_mistakes: Option<String>,
   #[serde(default)]
   pub modifications:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecommendations {
   pub exercises: Vec<RecommendedExercise>,
}

impl GeneratedArtifact for ExerciseRecommendations {
   const NAME: &'static str = "exercise_recommendations";
   const REQUIRED_FIELDS: &'static [&'static str] = &["exercises"];
}

// =========================================================================
// 食事
// =========================================================================

/// 生成された材料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Ingredient {
   pub name:     String,
   #[serde(default)]
   pub amount:   Option<Quantity>,
   #[serde(default)]
   pub unit:     Option<String>,
   #[serde(default)]
   pub calories: Option<f64>,
}

/// 生成された食事
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GeneratedMeal {
   pub title:             String,
   pub description:       String,
   pub meal_type:         String,
   #[serde(deserialize_with = "lenient::int")]
   pub calories:          i32,
   pub protein_g:         f64,
   pub carbs_g:           f64,
   pub fat_g:             f64,
   #[serde(default)]
   pub fiber_g:           Option<f64>,
   #[serde(default)]
   pub ingredients:       Vec<Ingredient>,
   #[serde(default)]
   pub instructions:      Vec<String>,
   #[serde(default, deserialize_with = "lenient::opt_int")]
   pub prep_time_minutes: Option<i32>,
   #[serde(default, deserialize_with = "lenient::opt_int")]
   pub cook_time_minutes: Option<i32>,
   #[serde(default, deserialize_with = "lenient::opt_int")]
   pub servings:          Option<i32>,
   #[serde(default)]
   pub tags:              Vec<String>,
   #[serde(default)]
   pub tips:              Option<String>,
   #[serde(default)]
   pub nutrition_notes:   Option<String>,
}

impl GeneratedArtifact for GeneratedMeal {
   const NAME: &'static str = "meal";
   const REQUIRED_FIELDS: &'static [&'static str] = &[
      "title",
      "description",
      "meal_type",
      "calories",
      "protein_g",
      "carbs_g",
      "fat_g",
   ];
}

impl GeneratedMeal {
   pub fn nutrition(&self) -> NutritionTotals {
      NutritionTotals::new(
         i64::from(self.calories),
         self.protein_g,
         self.carbs_g,
         self.fat_g,
      )
   }

   /// 単発保存時のメモ
   pub fn saved_notes(&self) -> String {
      format!(
         "Prep: {}min | Cook: {}min\n\nInstructions:\n{}\n\nTips: {}",
         self.prep_time_minutes.unwrap_or(0),
         self.cook_time_minutes.unwrap_or(0),
         numbered_steps(&self.instructions),
         or_empty(&self.tips),
      )
   }

   /// 日次スケジュール保存時のメモ
   pub fn scheduled_notes(&self) -> String {
      format!(
         "AI Generated\n\nInstructions:\n{}",
         numbered_steps(&self.instructions)
      )
   }

   /// 週間スケジュール保存時のメモ
   pub fn prep_notes(&self) -> String {
      format!("Prep: {}min", self.prep_time_minutes.unwrap_or(0))
   }

   /// 保存用の作成入力に変換する
   ///
   /// 食事区分は生成結果の値ではなく要求した区分を使う。
   pub fn to_new_meal(
      &self,
      meal_type: MealType,
      scheduled_date: NaiveDate,
      scheduled_time: Option<NaiveTime>,
      notes: String,
   ) -> Result<NewMeal, DomainError> {
      let ingredients = serde_json::to_value(&self.ingredients)
         .map_err(|e| DomainError::Validation(format!("材料を JSON に変換できません: {e}")))?;

      let mut meal = NewMeal::planned(Title::new(&self.title)?, meal_type, scheduled_date);
      meal.description = Some(self.description.clone());
      meal.calories = Some(self.calories);
      meal.protein_g = Some(self.protein_g);
      meal.carbs_g = Some(self.carbs_g);
      meal.fat_g = Some(self.fat_g);
      meal.ingredients = Some(ingredients);
      meal.scheduled_time = scheduled_time;
      meal.notes = Some(notes);
      Ok(meal)
   }
}

/// 1 日分の生成済み食事（区分順）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DailyMealPlan {
   pub date:         NaiveDate,
   pub meals:        BTreeMap<MealType, GeneratedMeal>,
   pub daily_totals: NutritionTotals,
}

impl DailyMealPlan {
   pub fn new(date: NaiveDate, meals: BTreeMap<MealType, GeneratedMeal>) -> Self {
      let daily_totals = meals.values().map(GeneratedMeal::nutrition).sum();
      Self {
         date,
         meals,
         daily_totals,
      }
   }
}

/// 週間食事プランの 1 日分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlannedMealDay {
   #[serde(deserialize_with = "lenient::int")]
   pub day:       i32,
   #[serde(default)]
   pub day_name:  Option<String>,
   #[serde(default)]
   pub breakfast: Option<String>,
   #[serde(default)]
   pub lunch:     Option<String>,
   #[serde(default)]
   pub dinner:    Option<String>,
   #[serde(default)]
   pub snack:     Option<String>,
   #[serde(default)]
   pub theme:     Option<String>,
}

/// 生成された週間食事プラン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WeeklyMealPlan {
   pub weekly_plan:    Vec<PlannedMealDay>,
   /// カテゴリ（produce, proteins など）ごとの買い物リスト
   pub shopping_list:  BTreeMap<String, Vec<String>>,
   #[serde(default)]
   pub meal_prep_tips: Option<String>,
   #[serde(default)]
   pub notes:          Option<String>,
}

impl GeneratedArtifact for WeeklyMealPlan {
   const NAME: &'static str = "weekly_meal_plan";
   const REQUIRED_FIELDS: &'static [&'static str] = &["weekly_plan", "shopping_list"];
}

/// 提案レシピ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Recipe {
   pub title:                String,
   #[serde(default)]
   pub cuisine:              Option<String>,
   #[serde(default)]
   pub difficulty:           Option<String>,
   #[serde(default, deserialize_with = "lenient::opt_int")]
   pub prep_time:            Option<i32>,
   #[serde(default, deserialize_with = "lenient::opt_int")]
   pub cook_time:            Option<i32>,
   #[serde(default, deserialize_with = "lenient::opt_int")]
   pub servings:             Option<i32>,
   #[serde(default, deserialize_with = "lenient::opt_int")]
   pub calories_per_serving: Option<i32>,
   #[serde(default)]
   pub description:          Option<String>,
   #[serde(default)]
   pub key_ingredients:      Vec<String>,
   #[serde(default)]
   pub tags:                 Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSuggestions {
   pub recipes: Vec<Recipe>,
}

impl GeneratedArtifact for RecipeSuggestions {
   const NAME: &'static str = "recipe_suggestions";
   const REQUIRED_FIELDS: &'static [&'static str] = &["recipes"];
}
