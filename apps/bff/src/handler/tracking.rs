//! # 健康記録 API ハンドラ
//!
//! 睡眠・体重・水分摂取の記録と参照。一覧は日付の新しい順。
//!
//! ## エンドポイント
//!
//! - `GET|POST /api/health/sleep`
//! - `GET|POST /api/health/weight`
//! - `GET|POST /api/health/water`

use std::sync::Arc;

use axum::{
   Extension,
   Json,
   extract::State,
   http::StatusCode,
   response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use fitplan_domain::tracking::{
   NewSleepEntry,
   NewWaterIntake,
   NewWeightEntry,
   SleepEntry,
   WaterIntake,
   WeightEntry,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::DateRangeQuery;
use crate::{
   client::Principal,
   error::{ApiJson, ApiQuery, BffError},
   usecase::TrackingUseCaseImpl,
};

/// 健康記録 API の共有状態
pub struct TrackingState {
   pub usecase: Arc<TrackingUseCaseImpl>,
}

// --- リクエスト型 ---

/// 睡眠記録リクエスト
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordSleepRequest {
   pub date:           NaiveDate,
   /// 睡眠時間（0 より大きく 24 以下）
   pub duration_hours: f64,
   /// 睡眠の質（1〜5）
   pub quality_rating: i16,
   pub notes:          Option<String>,
}

/// 体重記録リクエスト
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordWeightRequest {
   pub date:      NaiveDate,
   pub weight_kg: f64,
   pub notes:     Option<String>,
}

/// 水分摂取記録リクエスト
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordWaterRequest {
   pub date:      NaiveDate,
   pub amount_ml: i32,
}

// --- レスポンス型 ---

#[derive(Debug, Serialize, ToSchema)]
pub struct SleepData {
   pub id:             Uuid,
   pub user_id:        Uuid,
   pub date:           NaiveDate,
   pub duration_hours: f64,
   pub quality_rating: i16,
   pub notes:          Option<String>,
   pub created_at:     DateTime<Utc>,
}

impl From<SleepEntry> for SleepData {
   fn from(entry: SleepEntry) -> Self {
      Self {
         id:             *entry.id.as_uuid(),
         user_id:        *entry.user_id.as_uuid(),
         date:           entry.date,
         duration_hours: entry.duration_hours,
         quality_rating: entry.quality_rating,
         notes:          entry.notes,
         created_at:     entry.created_at,
      }
   }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeightData {
   pub id:         Uuid,
   pub user_id:    Uuid,
   pub date:       NaiveDate,
   pub weight_kg:  f64,
   pub notes:      Option<String>,
   pub created_at: DateTime<Utc>,
}

impl From<WeightEntry> for WeightData {
   fn from(entry: WeightEntry) -> Self {
      Self {
         id:         *entry.id.as_uuid(),
         user_id:    *entry.user_id.as_uuid(),
         date:       entry.date,
         weight_kg:  entry.weight_kg,
         notes:      entry.notes,
         created_at: entry.created_at,
      }
   }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WaterData {
   pub id:         Uuid,
   pub user_id:    Uuid,
   pub date:       NaiveDate,
   pub amount_ml:  i32,
   pub created_at: DateTime<Utc>,
}

impl From<WaterIntake> for WaterData {
   fn from(entry: WaterIntake) -> Self {
      Self {
         id:         *entry.id.as_uuid(),
         user_id:    *entry.user_id.as_uuid(),
         date:       entry.date,
         amount_ml:  entry.amount_ml,
         created_at: entry.created_at,
      }
   }
}

// --- ハンドラ ---

/// GET /api/health/sleep
#[utoipa::path(
   get,
   path = "/api/health/sleep",
   tag = "tracking",
   security(("bearer_auth" = [])),
   params(DateRangeQuery),
   responses(
      (status = 200, description = "睡眠記録（新しい順）", body = Vec<SleepData>)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn list_sleep(
   State(state): State<Arc<TrackingState>>,
   Extension(principal): Extension<Principal>,
   ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<impl IntoResponse, BffError> {
   let entries = state
      .usecase
      .list_sleep(&principal.user_id, &query.try_into()?)
      .await?;

   let items: Vec<SleepData> = entries.into_iter().map(SleepData::from).collect();
   Ok((StatusCode::OK, Json(items)))
}

/// POST /api/health/sleep
#[utoipa::path(
   post,
   path = "/api/health/sleep",
   tag = "tracking",
   security(("bearer_auth" = [])),
   request_body = RecordSleepRequest,
   responses(
      (status = 200, description = "記録した睡眠", body = SleepData),
      (status = 400, description = "値が範囲外", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn record_sleep(
   State(state): State<Arc<TrackingState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<RecordSleepRequest>,
) -> Result<impl IntoResponse, BffError> {
   let input = NewSleepEntry::new(req.date, req.duration_hours, req.quality_rating, req.notes)?;
   let entry = state.usecase.record_sleep(&principal.user_id, input).await?;

   Ok((StatusCode::OK, Json(SleepData::from(entry))))
}

/// GET /api/health/weight
#[utoipa::path(
   get,
   path = "/api/health/weight",
   tag = "tracking",
   security(("bearer_auth" = [])),
   params(DateRangeQuery),
   responses(
      (status = 200, description = "体重記録（新しい順）", body = Vec<WeightData>)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn list_weight(
   State(state): State<Arc<TrackingState>>,
   Extension(principal): Extension<Principal>,
   ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<impl IntoResponse, BffError> {
   let entries = state
      .usecase
      .list_weight(&principal.user_id, &query.try_into()?)
      .await?;

   let items: Vec<WeightData> = entries.into_iter().map(WeightData::from).collect();
   Ok((StatusCode::OK, Json(items)))
}

/// POST /api/health/weight
#[utoipa::path(
   post,
   path = "/api/health/weight",
   tag = "tracking",
   security(("bearer_auth" = [])),
   request_body = RecordWeightRequest,
   responses(
      (status = 200, description = "記録した体重", body = WeightData),
      (status = 400, description = "値が範囲外", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn record_weight(
   State(state): State<Arc<TrackingState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<RecordWeightRequest>,
) -> Result<impl IntoResponse, BffError> {
   let input = NewWeightEntry::new(req.date, req.weight_kg, req.notes)?;
   let entry = state
      .usecase
      .record_weight(&principal.user_id, input)
      .await?;

   Ok((StatusCode::OK, Json(WeightData::from(entry))))
}

/// GET /api/health/water
#[utoipa::path(
   get,
   path = "/api/health/water",
   tag = "tracking",
   security(("bearer_auth" = [])),
   params(DateRangeQuery),
   responses(
      (status = 200, description = "水分摂取記録（新しい順）", body = Vec<WaterData>)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn list_water(
   State(state): State<Arc<TrackingState>>,
   Extension(principal): Extension<Principal>,
   ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<impl IntoResponse, BffError> {
   let entries = state
      .usecase
      .list_water(&principal.user_id, &query.try_into()?)
      .await?;

   let items: Vec<WaterData> = entries.into_iter().map(WaterData::from).collect();
   Ok((StatusCode::OK, Json(items)))
}

/// POST /api/health/water
#[utoipa::path(
   post,
   path = "/api/health/water",
   tag = "tracking",
   security(("bearer_auth" = [])),
   request_body = RecordWaterRequest,
   responses(
      (status = 200, description = "記録した水分摂取", body = WaterData),
      (status = 400, description = "値が範囲外", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn record_water(
   State(state): State<Arc<TrackingState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<RecordWaterRequest>,
) -> Result<impl IntoResponse, BffError> {
   let input = NewWaterIntake::new(req.date, req.amount_ml)?;
   let entry = state.usecase.record_water(&principal.user_id, input).await?;

   Ok((StatusCode::OK, Json(WaterData::from(entry))))
}
