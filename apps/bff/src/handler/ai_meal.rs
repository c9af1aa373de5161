//! # AI 食事 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/ai/meals/generate` - 1 食生成（保存しない）
//! - `POST /api/ai/meals/generate-and-save` - 生成して指定日に保存
//! - `POST /api/ai/meals/daily-plan` - 4 区分の日次プラン
//! - `POST /api/ai/meals/weekly-plan` - 週間献立と買い物リスト
//! - `POST /api/ai/meals/recipe-suggestions` - レシピ提案

use std::sync::Arc;

use axum::{
   Extension,
   Json,
   extract::State,
   http::StatusCode,
   response::IntoResponse,
};
use chrono::NaiveDate;
use fitplan_domain::{
   generation::{DailyMealPlan, GeneratedMeal, Recipe, WeeklyMealPlan},
   meal::MealType,
};
use fitplan_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ScheduleSlotQuery, meal::MealData, to_preferences};
use crate::{
   client::Principal,
   error::{ApiJson, ApiQuery, BffError},
   usecase::{MealPlannerUseCaseImpl, Preferences},
};

/// AI 食事 API の共有状態
pub struct AiMealState {
   pub usecase: Arc<MealPlannerUseCaseImpl>,
}

// --- リクエスト型 ---

/// 食事生成リクエスト
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateMealRequest {
   pub meal_type:     MealType,
   pub cuisine:       Option<String>,
   /// 調理時間の上限（分）
   pub max_time:      Option<u32>,
   pub dietary_focus: Option<String>,
}

/// プロンプトに渡す追加条件（未指定も null として渡す）
#[derive(Serialize)]
struct MealPreferences<'a> {
   cuisine:       Option<&'a str>,
   max_time:      Option<u32>,
   dietary_focus: Option<&'a str>,
}

impl GenerateMealRequest {
   fn preferences(&self) -> Result<Preferences, BffError> {
      to_preferences(&MealPreferences {
         cuisine:       self.cuisine.as_deref(),
         max_time:      self.max_time,
         dietary_focus: self.dietary_focus.as_deref(),
      })
   }
}

/// 日次プランリクエスト
#[derive(Debug, Deserialize, ToSchema)]
pub struct DailyMealPlanRequest {
   pub date: NaiveDate,
}

/// 週間プランリクエスト
#[derive(Debug, Deserialize, ToSchema)]
pub struct WeeklyMealPlanRequest {
   /// 週の開始日（生成内容には影響しない）
   pub start_date: NaiveDate,
}

/// レシピ提案リクエスト
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RecipeSuggestionRequest {
   pub cuisine:  Option<String>,
   pub max_time: Option<u32>,
}

// --- レスポンス型 ---

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedMealPayload {
   pub meal: GeneratedMeal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedMealPayload {
   pub meal:       MealData,
   pub ai_details: GeneratedMeal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyMealPlanPayload {
   pub plan: DailyMealPlan,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklyMealPlanPayload {
   pub plan: WeeklyMealPlan,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeSuggestionsPayload {
   pub recipes: Vec<Recipe>,
}

// --- ハンドラ ---

/// POST /api/ai/meals/generate
#[utoipa::path(
   post,
   path = "/api/ai/meals/generate",
   tag = "ai-meals",
   security(("bearer_auth" = [])),
   request_body = GenerateMealRequest,
   responses(
      (status = 200, description = "生成した食事", body = ApiResponse<GeneratedMealPayload>),
      (status = 500, description = "生成失敗", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(meal_type = %req.meal_type))]
pub async fn generate_meal(
   State(state): State<Arc<AiMealState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<GenerateMealRequest>,
) -> Result<impl IntoResponse, BffError> {
   let preferences = req.preferences()?;
   let meal = state
      .usecase
      .generate(&principal.user_id, req.meal_type, &preferences)
      .await?;

   let response = ApiResponse::new(GeneratedMealPayload { meal }, "Meal generated successfully");
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/ai/meals/generate-and-save
#[utoipa::path(
   post,
   path = "/api/ai/meals/generate-and-save",
   tag = "ai-meals",
   security(("bearer_auth" = [])),
   params(ScheduleSlotQuery),
   request_body = GenerateMealRequest,
   responses(
      (status = 200, description = "保存した食事", body = ApiResponse<SavedMealPayload>),
      (status = 400, description = "scheduled_date がない", body = fitplan_shared::ErrorResponse),
      (status = 500, description = "生成失敗", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(meal_type = %req.meal_type))]
pub async fn generate_and_save_meal(
   State(state): State<Arc<AiMealState>>,
   Extension(principal): Extension<Principal>,
   ApiQuery(slot): ApiQuery<ScheduleSlotQuery>,
   ApiJson(req): ApiJson<GenerateMealRequest>,
) -> Result<impl IntoResponse, BffError> {
   let preferences = req.preferences()?;
   let (meal, ai_details) = state
      .usecase
      .generate_and_save(
         &principal.user_id,
         req.meal_type,
         &preferences,
         slot.scheduled_date,
         slot.scheduled_time,
      )
      .await?;

   let response = ApiResponse::new(
      SavedMealPayload {
         meal: MealData::from(meal),
         ai_details,
      },
      "Meal generated and saved successfully",
   );
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/ai/meals/daily-plan
#[utoipa::path(
   post,
   path = "/api/ai/meals/daily-plan",
   tag = "ai-meals",
   security(("bearer_auth" = [])),
   request_body = DailyMealPlanRequest,
   responses(
      (status = 200, description = "日次プラン", body = ApiResponse<DailyMealPlanPayload>),
      (status = 500, description = "生成失敗", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(date = %req.date))]
pub async fn create_daily_meal_plan(
   State(state): State<Arc<AiMealState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<DailyMealPlanRequest>,
) -> Result<impl IntoResponse, BffError> {
   let plan = state
      .usecase
      .daily_plan(&principal.user_id, req.date)
      .await?;

   let response = ApiResponse::new(
      DailyMealPlanPayload { plan },
      "Daily meal plan generated successfully",
   );
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/ai/meals/weekly-plan
#[utoipa::path(
   post,
   path = "/api/ai/meals/weekly-plan",
   tag = "ai-meals",
   security(("bearer_auth" = [])),
   request_body = WeeklyMealPlanRequest,
   responses(
      (status = 200, description = "週間献立と買い物リスト", body = ApiResponse<WeeklyMealPlanPayload>),
      (status = 500, description = "生成失敗", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(start_date = %req.start_date))]
pub async fn create_weekly_meal_plan(
   State(state): State<Arc<AiMealState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<WeeklyMealPlanRequest>,
) -> Result<impl IntoResponse, BffError> {
   let plan = state.usecase.weekly_plan(&principal.user_id).await?;

   let response = ApiResponse::new(
      WeeklyMealPlanPayload { plan },
      "Weekly meal plan generated successfully",
   );
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/ai/meals/recipe-suggestions
#[utoipa::path(
   post,
   path = "/api/ai/meals/recipe-suggestions",
   tag = "ai-meals",
   security(("bearer_auth" = [])),
   request_body = RecipeSuggestionRequest,
   responses(
      (status = 200, description = "提案レシピ", body = ApiResponse<RecipeSuggestionsPayload>),
      (status = 500, description = "生成失敗", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn suggest_recipes(
   State(state): State<Arc<AiMealState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<RecipeSuggestionRequest>,
) -> Result<impl IntoResponse, BffError> {
   let recipes = state
      .usecase
      .recipe_suggestions(&principal.user_id, req.cuisine.as_deref(), req.max_time)
      .await?;

   let response = ApiResponse::new(
      RecipeSuggestionsPayload { recipes },
      "Recipe suggestions generated",
   );
   Ok((StatusCode::OK, Json(response)))
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;

   use super::*;

   #[test]
   fn test_generate_meal_request_未指定の条件もnullとして渡す() {
      let req: GenerateMealRequest = serde_json::from_value(serde_json::json!({
         "meal_type": "dinner",
         "cuisine": "japanese"
      }))
      .unwrap();

      let preferences = req.preferences().unwrap();

      assert_eq!(preferences.len(), 3);
      assert_eq!(preferences["cuisine"], "japanese");
      assert_eq!(preferences["max_time"], serde_json::Value::Null);
      assert_eq!(preferences["dietary_focus"], serde_json::Value::Null);
   }

   #[test]
   fn test_weekly_meal_plan_request_start_dateは必須() {
      assert!(serde_json::from_str::<WeeklyMealPlanRequest>("{}").is_err());
   }
}
