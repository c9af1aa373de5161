//! # スケジュール API ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/scheduler/daily` - 日次スケジュール生成（生成済みなら既存を返す）
//! - `POST /api/scheduler/weekly` - 週間スケジュール生成
//! - `POST /api/scheduler/get` - 期間内のスケジュール
//! - `PATCH /api/scheduler/update` - 項目の部分更新
//! - `DELETE /api/scheduler/{item_type}/{item_id}` - 項目の削除

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
   nutrition::NutritionTotals,
   schedule::{ScheduleItemType, ScheduledDay},
};
use fitplan_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
   ItemUpdateRequest,
   NoPayload,
   check_days_per_week,
   default_days_per_week,
   meal::MealData,
   workout::WorkoutData,
};
use crate::{
   client::Principal,
   error::{ApiJson, ApiPath, BffError},
   usecase::{
      DailySchedule,
      ScheduleItem,
      SchedulerUseCaseImpl,
      WeeklySchedule,
      WeeklyScheduleDay,
   },
};

/// スケジュール API の共有状態
pub struct SchedulerState {
   pub usecase: Arc<SchedulerUseCaseImpl>,
}

// --- リクエスト型 ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct DailyScheduleRequest {
   pub date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WeeklyScheduleRequest {
   pub start_date:    NaiveDate,
   /// 運動日数（1〜7、既定 4）
   #[serde(default = "default_days_per_week")]
   pub days_per_week: u8,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleRangeRequest {
   pub start_date: NaiveDate,
   pub end_date:   NaiveDate,
}

/// 項目更新リクエスト
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateScheduleItemRequest {
   /// `workout` または `meal`
   pub item_type: String,
   pub item_id:   Uuid,
   pub updates:   ItemUpdateRequest,
}

// --- レスポンス型 ---

/// 日次スケジュール
#[derive(Debug, Serialize, ToSchema)]
pub struct DailyScheduleData {
   pub date:            NaiveDate,
   pub workouts:        Vec<WorkoutData>,
   pub meals:           Vec<MealData>,
   /// このリクエストで生成したか
   pub generated:       bool,
   pub daily_nutrition: Option<NutritionTotals>,
}

impl From<DailySchedule> for DailyScheduleData {
   fn from(schedule: DailySchedule) -> Self {
      Self {
         date:            schedule.date,
         workouts:        schedule.workouts.into_iter().map(WorkoutData::from).collect(),
         meals:           schedule.meals.into_iter().map(MealData::from).collect(),
         generated:       schedule.generated,
         daily_nutrition: schedule.daily_nutrition,
      }
   }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklyScheduleDayData {
   pub date:            NaiveDate,
   /// 英語の曜日名（`Monday` など）
   pub day_name:        String,
   pub workouts:        Vec<WorkoutData>,
   pub meals:           Vec<MealData>,
   pub daily_nutrition: NutritionTotals,
}

impl From<WeeklyScheduleDay> for WeeklyScheduleDayData {
   fn from(day: WeeklyScheduleDay) -> Self {
      Self {
         date:            day.date,
         day_name:        day.day_name,
         workouts:        day.workouts.into_iter().map(WorkoutData::from).collect(),
         meals:           day.meals.into_iter().map(MealData::from).collect(),
         daily_nutrition: day.daily_nutrition,
      }
   }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklyScheduleData {
   pub start_date: NaiveDate,
   pub end_date:   NaiveDate,
   pub days:       Vec<WeeklyScheduleDayData>,
}

impl From<WeeklySchedule> for WeeklyScheduleData {
   fn from(schedule: WeeklySchedule) -> Self {
      Self {
         start_date: schedule.start_date,
         end_date:   schedule.end_date,
         days:       schedule
            .days
            .into_iter()
            .map(WeeklyScheduleDayData::from)
            .collect(),
      }
   }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduledDayData {
   pub date:     NaiveDate,
   pub workouts: Vec<WorkoutData>,
   pub meals:    Vec<MealData>,
}

impl From<ScheduledDay> for ScheduledDayData {
   fn from(day: ScheduledDay) -> Self {
      Self {
         date:     day.date,
         workouts: day.workouts.into_iter().map(WorkoutData::from).collect(),
         meals:    day.meals.into_iter().map(MealData::from).collect(),
      }
   }
}

/// 期間内のスケジュール
#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleRangeData {
   pub start_date: NaiveDate,
   pub end_date:   NaiveDate,
   /// 予定のある日だけ（日付の昇順）
   pub schedule:   Vec<ScheduledDayData>,
}

/// 更新後の項目（ワークアウトまたは食事）
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ScheduleItemData {
   Workout(WorkoutData),
   Meal(MealData),
}

impl From<ScheduleItem> for ScheduleItemData {
   fn from(item: ScheduleItem) -> Self {
      match item {
         ScheduleItem::Workout(w) => Self::Workout(WorkoutData::from(w)),
         ScheduleItem::Meal(m) => Self::Meal(MealData::from(m)),
      }
   }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailySchedulePayload {
   pub schedule: DailyScheduleData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklySchedulePayload {
   pub schedule: WeeklyScheduleData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleRangePayload {
   pub schedule: ScheduleRangeData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleItemPayload {
   pub item: ScheduleItemData,
}

/// `workout` → `Workout`
fn capitalized(item_type: ScheduleItemType) -> &'static str {
   match item_type {
      ScheduleItemType::Workout => "Workout",
      ScheduleItemType::Meal => "Meal",
   }
}

// --- ハンドラ ---

/// POST /api/scheduler/daily
///
/// 同じ日付への 2 回目以降の呼び出しは何も生成せず、既存の予定を返す。
#[utoipa::path(
   post,
   path = "/api/scheduler/daily",
   tag = "scheduler",
   security(("bearer_auth" = [])),
   request_body = DailyScheduleRequest,
   responses(
      (status = 200, description = "日次スケジュール", body = ApiResponse<DailySchedulePayload>),
      (status = 500, description = "生成失敗（書き込みはロールバック済み）", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(date = %req.date))]
pub async fn create_daily_schedule(
   State(state): State<Arc<SchedulerState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<DailyScheduleRequest>,
) -> Result<impl IntoResponse, BffError> {
   let schedule = state.usecase.daily(&principal.user_id, req.date).await?;

   let message = if schedule.generated {
      "Daily schedule generated successfully"
   } else {
      "Existing schedule retrieved"
   };
   let response = ApiResponse::new(
      DailySchedulePayload {
         schedule: schedule.into(),
      },
      message,
   );
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/scheduler/weekly
#[utoipa::path(
   post,
   path = "/api/scheduler/weekly",
   tag = "scheduler",
   security(("bearer_auth" = [])),
   request_body = WeeklyScheduleRequest,
   responses(
      (status = 200, description = "週間スケジュール", body = ApiResponse<WeeklySchedulePayload>),
      (status = 400, description = "days_per_week が範囲外", body = fitplan_shared::ErrorResponse),
      (status = 500, description = "生成失敗", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(start_date = %req.start_date))]
pub async fn create_weekly_schedule(
   State(state): State<Arc<SchedulerState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<WeeklyScheduleRequest>,
) -> Result<impl IntoResponse, BffError> {
   let days_per_week = check_days_per_week(req.days_per_week)?;
   let schedule = state
      .usecase
      .weekly(&principal.user_id, req.start_date, days_per_week)
      .await?;

   let message = format!("Weekly schedule generated for {} days", schedule.days.len());
   let response = ApiResponse::new(
      WeeklySchedulePayload {
         schedule: schedule.into(),
      },
      message,
   );
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/scheduler/get
#[utoipa::path(
   post,
   path = "/api/scheduler/get",
   tag = "scheduler",
   security(("bearer_auth" = [])),
   request_body = ScheduleRangeRequest,
   responses(
      (status = 200, description = "期間内のスケジュール", body = ApiResponse<ScheduleRangePayload>),
      (status = 400, description = "日付範囲が不正", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(start_date = %req.start_date, end_date = %req.end_date))]
pub async fn get_schedule_range(
   State(state): State<Arc<SchedulerState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<ScheduleRangeRequest>,
) -> Result<impl IntoResponse, BffError> {
   let days = state
      .usecase
      .get(&principal.user_id, req.start_date, req.end_date)
      .await?;

   let response = ApiResponse::new(
      ScheduleRangePayload {
         schedule: ScheduleRangeData {
            start_date: req.start_date,
            end_date:   req.end_date,
            schedule:   days.into_iter().map(ScheduledDayData::from).collect(),
         },
      },
      "Schedule retrieved successfully",
   );
   Ok((StatusCode::OK, Json(response)))
}

/// PATCH /api/scheduler/update
#[utoipa::path(
   patch,
   path = "/api/scheduler/update",
   tag = "scheduler",
   security(("bearer_auth" = [])),
   request_body = UpdateScheduleItemRequest,
   responses(
      (status = 200, description = "更新後の項目", body = ApiResponse<ScheduleItemPayload>),
      (status = 400, description = "項目種別が不正", body = fitplan_shared::ErrorResponse),
      (status = 404, description = "項目が見つからない", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(item_type = %req.item_type, item_id = %req.item_id))]
pub async fn update_schedule_item(
   State(state): State<Arc<SchedulerState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<UpdateScheduleItemRequest>,
) -> Result<impl IntoResponse, BffError> {
   let item = state
      .usecase
      .update_item(
         &principal.user_id,
         &req.item_type,
         req.item_id,
         req.updates.try_into()?,
      )
      .await?;

   let label = match item {
      ScheduleItem::Workout(_) => capitalized(ScheduleItemType::Workout),
      ScheduleItem::Meal(_) => capitalized(ScheduleItemType::Meal),
   };
   let response = ApiResponse::new(
      ScheduleItemPayload { item: item.into() },
      format!("{label} updated successfully"),
   );
   Ok((StatusCode::OK, Json(response)))
}

/// DELETE /api/scheduler/{item_type}/{item_id}
#[utoipa::path(
   delete,
   path = "/api/scheduler/{item_type}/{item_id}",
   tag = "scheduler",
   security(("bearer_auth" = [])),
   params(
      ("item_type" = String, Path, description = "`workout` または `meal`"),
      ("item_id" = Uuid, Path, description = "項目 ID")
   ),
   responses(
      (status = 200, description = "削除成功", body = ApiResponse<NoPayload>),
      (status = 400, description = "項目種別が不正", body = fitplan_shared::ErrorResponse),
      (status = 404, description = "項目が見つからない", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(%item_type, %item_id))]
pub async fn delete_schedule_item(
   State(state): State<Arc<SchedulerState>>,
   Extension(principal): Extension<Principal>,
   ApiPath((item_type, item_id)): ApiPath<(String, Uuid)>,
) -> Result<impl IntoResponse, BffError> {
   let deleted = state
      .usecase
      .delete_item(&principal.user_id, &item_type, item_id)
      .await?;

   let response = ApiResponse::new(
      NoPayload {},
      format!("{} deleted successfully", capitalized(deleted)),
   );
   Ok((StatusCode::OK, Json(response)))
}
