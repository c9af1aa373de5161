//! # ワークアウト API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/workouts` - 一覧（`start_date` / `end_date` で絞り込み、予定日の昇順）
//! - `POST /api/workouts` - 作成
//! - `PATCH /api/workouts/{id}` - 部分更新
//! - `DELETE /api/workouts/{id}` - 削除

use std::sync::Arc;

use axum::{
   Extension,
   Json,
   extract::State,
   http::StatusCode,
   response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use fitplan_domain::{
   DomainError,
   value_objects::Title,
   workout::{NewWorkout, Workout, WorkoutId},
};
use fitplan_shared::MessageResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{DateRangeQuery, ItemUpdateRequest};
use crate::{
   client::Principal,
   error::{ApiJson, ApiPath, ApiQuery, BffError},
   usecase::WorkoutUseCaseImpl,
};

/// ワークアウト API の共有状態
pub struct WorkoutState {
   pub usecase: Arc<WorkoutUseCaseImpl>,
}

// --- リクエスト型 ---

/// ワークアウト作成リクエスト
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWorkoutRequest {
   pub title:            String,
   pub description:      Option<String>,
   /// 種別（例: `cardio`, `strength`, `flexibility`）
   pub workout_type:     String,
   pub duration_minutes: Option<i32>,
   pub calories_burned:  Option<i32>,
   pub intensity:        Option<String>,
   pub scheduled_date:   NaiveDate,
   pub scheduled_time:   Option<NaiveTime>,
   pub notes:            Option<String>,
}

impl TryFrom<CreateWorkoutRequest> for NewWorkout {
   type Error = DomainError;

   fn try_from(req: CreateWorkoutRequest) -> Result<Self, Self::Error> {
      let mut workout =
         NewWorkout::planned(Title::new(req.title)?, req.workout_type, req.scheduled_date);
      workout.description = req.description;
      workout.duration_minutes = req.duration_minutes;
      workout.calories_burned = req.calories_burned;
      workout.intensity = req.intensity;
      workout.scheduled_time = req.scheduled_time;
      workout.notes = req.notes;
      Ok(workout)
   }
}

// --- レスポンス型 ---

/// ワークアウトデータ
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkoutData {
   pub id:               Uuid,
   pub user_id:          Uuid,
   pub title:            String,
   pub description:      Option<String>,
   pub workout_type:     String,
   pub duration_minutes: Option<i32>,
   pub calories_burned:  Option<i32>,
   pub intensity:        Option<String>,
   pub scheduled_date:   NaiveDate,
   pub scheduled_time:   Option<NaiveTime>,
   pub notes:            Option<String>,
   pub completed:        bool,
   pub completed_at:     Option<DateTime<Utc>>,
   /// 取り込み元（Strava から同期した場合のみ）
   pub source_provider:  Option<String>,
   pub external_id:      Option<String>,
   pub created_at:       DateTime<Utc>,
   pub updated_at:       DateTime<Utc>,
}

impl From<Workout> for WorkoutData {
   fn from(workout: Workout) -> Self {
      let (source_provider, external_id) = match workout.source {
         Some(source) => (Some(source.provider), Some(source.external_id)),
         None => (None, None),
      };
      Self {
         id: *workout.id.as_uuid(),
         user_id: *workout.user_id.as_uuid(),
         title: workout.title,
         description: workout.description,
         workout_type: workout.workout_type,
         duration_minutes: workout.duration_minutes,
         calories_burned: workout.calories_burned,
         intensity: workout.intensity,
         scheduled_date: workout.scheduled_date,
         scheduled_time: workout.scheduled_time,
         notes: workout.notes,
         completed: workout.completed,
         completed_at: workout.completed_at,
         source_provider,
         external_id,
         created_at: workout.created_at,
         updated_at: workout.updated_at,
      }
   }
}

// --- ハンドラ ---

/// GET /api/workouts
#[utoipa::path(
   get,
   path = "/api/workouts",
   tag = "workouts",
   security(("bearer_auth" = [])),
   params(DateRangeQuery),
   responses(
      (status = 200, description = "ワークアウト一覧", body = Vec<WorkoutData>),
      (status = 400, description = "日付範囲が不正", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn list_workouts(
   State(state): State<Arc<WorkoutState>>,
   Extension(principal): Extension<Principal>,
   ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<impl IntoResponse, BffError> {
   let workouts = state
      .usecase
      .list(&principal.user_id, &query.try_into()?)
      .await?;

   let items: Vec<WorkoutData> = workouts.into_iter().map(WorkoutData::from).collect();
   Ok((StatusCode::OK, Json(items)))
}

/// POST /api/workouts
#[utoipa::path(
   post,
   path = "/api/workouts",
   tag = "workouts",
   security(("bearer_auth" = [])),
   request_body = CreateWorkoutRequest,
   responses(
      (status = 200, description = "作成したワークアウト", body = WorkoutData),
      (status = 400, description = "バリデーションエラー", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn create_workout(
   State(state): State<Arc<WorkoutState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<CreateWorkoutRequest>,
) -> Result<impl IntoResponse, BffError> {
   let workout = state
      .usecase
      .create(&principal.user_id, req.try_into()?)
      .await?;

   Ok((StatusCode::OK, Json(WorkoutData::from(workout))))
}

/// PATCH /api/workouts/{id}
#[utoipa::path(
   patch,
   path = "/api/workouts/{id}",
   tag = "workouts",
   security(("bearer_auth" = [])),
   params(("id" = Uuid, Path, description = "ワークアウト ID")),
   request_body = ItemUpdateRequest,
   responses(
      (status = 200, description = "更新後のワークアウト", body = WorkoutData),
      (status = 400, description = "更新するフィールドがない", body = fitplan_shared::ErrorResponse),
      (status = 404, description = "ワークアウトが見つからない", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(%id))]
pub async fn update_workout(
   State(state): State<Arc<WorkoutState>>,
   Extension(principal): Extension<Principal>,
   ApiPath(id): ApiPath<Uuid>,
   ApiJson(req): ApiJson<ItemUpdateRequest>,
) -> Result<impl IntoResponse, BffError> {
   let workout = state
      .usecase
      .update(
         &principal.user_id,
         &WorkoutId::from_uuid(id),
         req.try_into()?,
      )
      .await?;

   Ok((StatusCode::OK, Json(WorkoutData::from(workout))))
}

/// DELETE /api/workouts/{id}
#[utoipa::path(
   delete,
   path = "/api/workouts/{id}",
   tag = "workouts",
   security(("bearer_auth" = [])),
   params(("id" = Uuid, Path, description = "ワークアウト ID")),
   responses(
      (status = 200, description = "削除成功", body = MessageResponse),
      (status = 404, description = "ワークアウトが見つからない", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_workout(
   State(state): State<Arc<WorkoutState>>,
   Extension(principal): Extension<Principal>,
   ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, BffError> {
   state
      .usecase
      .delete(&principal.user_id, &WorkoutId::from_uuid(id))
      .await?;

   Ok((
      StatusCode::OK,
      Json(MessageResponse::new("Workout deleted successfully")),
   ))
}
