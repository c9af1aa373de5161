//! # AI ワークアウト API ハンドラ
//!
//! LLM によるワークアウト生成。プロフィール・目標・直近の履歴を文脈に渡す。
//!
//! ## エンドポイント
//!
//! - `POST /api/ai/workouts/generate` - 1 件生成（保存しない）
//! - `POST /api/ai/workouts/generate-and-save` - 生成して指定日に保存
//! - `POST /api/ai/workouts/weekly-plan` - 週間プランを生成し、休養日以外を保存
//! - `POST /api/ai/workouts/exercise-recommendations` - エクササイズ推薦

use std::sync::Arc;

use axum::{
   Extension,
   Json,
   extract::State,
   http::StatusCode,
   response::IntoResponse,
};
use chrono::NaiveDate;
use fitplan_domain::generation::{GeneratedWorkout, PlannedWorkoutDay, RecommendedExercise};
use fitplan_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
   ScheduleSlotQuery,
   check_days_per_week,
   default_days_per_week,
   to_preferences,
   workout::WorkoutData,
};
use crate::{
   client::Principal,
   error::{ApiJson, ApiQuery, BffError},
   usecase::WorkoutGeneratorUseCaseImpl,
};

/// AI ワークアウト API の共有状態
pub struct AiWorkoutState {
   pub usecase: Arc<WorkoutGeneratorUseCaseImpl>,
}

// --- リクエスト型 ---

/// ワークアウト生成リクエスト
///
/// 指定したフィールドだけが生成条件としてプロンプトに渡る。
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct GenerateWorkoutRequest {
   #[serde(skip_serializing_if = "Option::is_none")]
   pub workout_type:     Option<String>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub duration_minutes: Option<i32>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub intensity:        Option<String>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub focus_areas:      Option<Vec<String>>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub equipment:        Option<Vec<String>>,
}

/// 週間プラン生成リクエスト
#[derive(Debug, Deserialize, ToSchema)]
pub struct WeeklyWorkoutPlanRequest {
   /// 運動日数（1〜7、既定 4）
   #[serde(default = "default_days_per_week")]
   pub days_per_week: u8,
   /// プランの 1 日目
   pub start_date:    NaiveDate,
}

/// エクササイズ推薦リクエスト
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ExerciseRecommendationRequest {
   pub muscle_group: Option<String>,
   pub equipment:    Option<String>,
}

// --- レスポンス型 ---

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedWorkoutPayload {
   pub workout: GeneratedWorkout,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedWorkoutPayload {
   /// 保存した行
   pub workout:    WorkoutData,
   /// 生成結果の全体（エクササイズ一覧を含む）
   pub ai_details: GeneratedWorkout,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklyWorkoutPlanPayload {
   pub plan:           Vec<PlannedWorkoutDay>,
   pub saved_workouts: Vec<WorkoutData>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExerciseRecommendationsPayload {
   pub exercises: Vec<RecommendedExercise>,
}

// --- ハンドラ ---

/// POST /api/ai/workouts/generate
#[utoipa::path(
   post,
   path = "/api/ai/workouts/generate",
   tag = "ai-workouts",
   security(("bearer_auth" = [])),
   request_body = GenerateWorkoutRequest,
   responses(
      (status = 200, description = "生成したワークアウト", body = ApiResponse<GeneratedWorkoutPayload>),
      (status = 500, description = "生成失敗", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn generate_workout(
   State(state): State<Arc<AiWorkoutState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<GenerateWorkoutRequest>,
) -> Result<impl IntoResponse, BffError> {
   let preferences = to_preferences(&req)?;
   let workout = state
      .usecase
      .generate(&principal.user_id, &preferences)
      .await?;

   let response = ApiResponse::new(
      GeneratedWorkoutPayload { workout },
      "Workout generated successfully",
   );
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/ai/workouts/generate-and-save
#[utoipa::path(
   post,
   path = "/api/ai/workouts/generate-and-save",
   tag = "ai-workouts",
   security(("bearer_auth" = [])),
   params(ScheduleSlotQuery),
   request_body = GenerateWorkoutRequest,
   responses(
      (status = 200, description = "保存したワークアウト", body = ApiResponse<SavedWorkoutPayload>),
      (status = 400, description = "scheduled_date がない", body = fitplan_shared::ErrorResponse),
      (status = 500, description = "生成失敗", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(scheduled_date = %slot.scheduled_date))]
pub async fn generate_and_save_workout(
   State(state): State<Arc<AiWorkoutState>>,
   Extension(principal): Extension<Principal>,
   ApiQuery(slot): ApiQuery<ScheduleSlotQuery>,
   ApiJson(req): ApiJson<GenerateWorkoutRequest>,
) -> Result<impl IntoResponse, BffError> {
   let preferences = to_preferences(&req)?;
   let (workout, ai_details) = state
      .usecase
      .generate_and_save(
         &principal.user_id,
         &preferences,
         slot.scheduled_date,
         slot.scheduled_time,
      )
      .await?;

   let response = ApiResponse::new(
      SavedWorkoutPayload {
         workout: WorkoutData::from(workout),
         ai_details,
      },
      "Workout generated and saved successfully",
   );
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/ai/workouts/weekly-plan
#[utoipa::path(
   post,
   path = "/api/ai/workouts/weekly-plan",
   tag = "ai-workouts",
   security(("bearer_auth" = [])),
   request_body = WeeklyWorkoutPlanRequest,
   responses(
      (status = 200, description = "週間プランと保存したワークアウト", body = ApiResponse<WeeklyWorkoutPlanPayload>),
      (status = 400, description = "days_per_week が範囲外", body = fitplan_shared::ErrorResponse),
      (status = 500, description = "生成失敗", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(start_date = %req.start_date))]
pub async fn create_weekly_workout_plan(
   State(state): State<Arc<AiWorkoutState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<WeeklyWorkoutPlanRequest>,
) -> Result<impl IntoResponse, BffError> {
   let days_per_week = check_days_per_week(req.days_per_week)?;
   let (plan, saved) = state
      .usecase
      .weekly_plan_and_save(&principal.user_id, days_per_week, req.start_date)
      .await?;

   let message = format!("Weekly plan generated with {} workouts", saved.len());
   let response = ApiResponse::new(
      WeeklyWorkoutPlanPayload {
         plan:           plan.plan,
         saved_workouts: saved.into_iter().map(WorkoutData::from).collect(),
      },
      message,
   );
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/ai/workouts/exercise-recommendations
#[utoipa::path(
   post,
   path = "/api/ai/workouts/exercise-recommendations",
   tag = "ai-workouts",
   security(("bearer_auth" = [])),
   request_body = ExerciseRecommendationRequest,
   responses(
      (status = 200, description = "推薦エクササイズ", body = ApiResponse<ExerciseRecommendationsPayload>),
      (status = 500, description = "生成失敗", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn recommend_exercises(
   State(state): State<Arc<AiWorkoutState>>,
   Extension(_principal): Extension<Principal>,
   ApiJson(req): ApiJson<ExerciseRecommendationRequest>,
) -> Result<impl IntoResponse, BffError> {
   let exercises = state
      .usecase
      .exercise_recommendations(req.muscle_group.as_deref(), req.equipment.as_deref())
      .await?;

   let response = ApiResponse::new(
      ExerciseRecommendationsPayload { exercises },
      "Exercise recommendations generated",
   );
   Ok((StatusCode::OK, Json(response)))
}
