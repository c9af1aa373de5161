//! # Strava API ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/strava/connect` - 認可 URL の発行
//! - `POST /api/strava/callback` - 認可コードの交換と連携の保存
//! - `GET /api/strava/stats` - アスリート情報と統計
//! - `GET /api/strava/activities` - 直近のアクティビティ（`days` 1〜90、既定 7）
//! - `POST /api/strava/sync` - アクティビティをワークアウトに取り込む
//! - `POST /api/strava/create-activity` - ワークアウトをアクティビティとして登録
//! - `DELETE /api/strava/disconnect` - 連携の解除
//!
//! 連携がない状態でトークンが必要な操作を呼ぶと 404。

use std::sync::Arc;

use axum::{
   Extension,
   Json,
   extract::State,
   http::StatusCode,
   response::IntoResponse,
};
use fitplan_domain::{activity::StravaActivity, integration::SyncSummary, workout::WorkoutId};
use fitplan_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{NoPayload, integration::IntegrationData};
use crate::{
   client::{Athlete, Principal},
   error::{ApiJson, ApiQuery, BffError},
   usecase::{AthleteStats, DEFAULT_ACTIVITY_DAYS, StravaUseCaseImpl},
};

/// Strava API の共有状態
pub struct StravaState {
   pub usecase: Arc<StravaUseCaseImpl>,
}

fn default_days() -> i64 {
   DEFAULT_ACTIVITY_DAYS
}

// --- リクエスト型 ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConnectRequest {
   /// 認可後に戻る URL
   pub redirect_uri: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CallbackRequest {
   /// 認可コード
   pub code: String,
}

/// アクティビティ取得クエリ
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivitiesQuery {
   /// 対象期間（日数、1〜90）
   #[serde(default = "default_days")]
   pub days: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncRequest {
   /// 対象期間（日数、1〜90、既定 7）
   #[serde(default = "default_days")]
   pub days: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateActivityRequest {
   pub workout_id: Uuid,
}

// --- レスポンス型 ---

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorizationUrlPayload {
   pub authorization_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IntegrationPayload {
   pub integration: IntegrationData,
}

/// アスリート情報と統計（Strava の応答をそのまま返す）
#[derive(Debug, Serialize, ToSchema)]
pub struct AthleteStatsData {
   #[schema(value_type = Object)]
   pub athlete: Athlete,
   #[schema(value_type = Object)]
   pub stats:   serde_json::Value,
}

impl From<AthleteStats> for AthleteStatsData {
   fn from(stats: AthleteStats) -> Self {
      Self {
         athlete: stats.athlete,
         stats:   stats.stats,
      }
   }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsPayload {
   pub stats: AthleteStatsData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivitiesPayload {
   #[schema(value_type = Vec<Object>)]
   pub activities: Vec<StravaActivity>,
   pub count:      usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncPayload {
   pub sync_result: SyncSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityPayload {
   /// 作成されたアクティビティ（Strava の応答）
   #[schema(value_type = Object)]
   pub activity: serde_json::Value,
}

// --- ハンドラ ---

/// POST /api/strava/connect
#[utoipa::path(
   post,
   path = "/api/strava/connect",
   tag = "strava",
   security(("bearer_auth" = [])),
   request_body = ConnectRequest,
   responses(
      (status = 200, description = "認可 URL", body = ApiResponse<AuthorizationUrlPayload>)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn connect_strava(
   State(state): State<Arc<StravaState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<ConnectRequest>,
) -> Result<impl IntoResponse, BffError> {
   let url = state
      .usecase
      .connect(&principal.user_id, &req.redirect_uri)?;

   let response = ApiResponse::new(
      AuthorizationUrlPayload {
         authorization_url: url.to_string(),
      },
      "Redirect user to this URL to authorize Strava",
   );
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/strava/callback
#[utoipa::path(
   post,
   path = "/api/strava/callback",
   tag = "strava",
   security(("bearer_auth" = [])),
   request_body = CallbackRequest,
   responses(
      (status = 200, description = "保存した連携", body = ApiResponse<IntegrationPayload>),
      (status = 500, description = "コード交換の失敗", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn strava_callback(
   State(state): State<Arc<StravaState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<CallbackRequest>,
) -> Result<impl IntoResponse, BffError> {
   let integration = state
      .usecase
      .callback(&principal.user_id, &req.code)
      .await?;

   let response = ApiResponse::new(
      IntegrationPayload {
         integration: IntegrationData::from(&integration),
      },
      "Strava connected successfully",
   );
   Ok((StatusCode::OK, Json(response)))
}

/// GET /api/strava/stats
#[utoipa::path(
   get,
   path = "/api/strava/stats",
   tag = "strava",
   security(("bearer_auth" = [])),
   responses(
      (status = 200, description = "アスリート情報と統計", body = ApiResponse<StatsPayload>),
      (status = 404, description = "Strava 未接続", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn get_strava_stats(
   State(state): State<Arc<StravaState>>,
   Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, BffError> {
   let stats = state.usecase.stats(&principal.user_id).await?;

   let response = ApiResponse::new(
      StatsPayload {
         stats: stats.into(),
      },
      "Stats retrieved successfully",
   );
   Ok((StatusCode::OK, Json(response)))
}

/// GET /api/strava/activities
#[utoipa::path(
   get,
   path = "/api/strava/activities",
   tag = "strava",
   security(("bearer_auth" = [])),
   params(ActivitiesQuery),
   responses(
      (status = 200, description = "直近のアクティビティ", body = ApiResponse<ActivitiesPayload>),
      (status = 400, description = "days が範囲外", body = fitplan_shared::ErrorResponse),
      (status = 404, description = "Strava 未接続", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(days = query.days))]
pub async fn get_strava_activities(
   State(state): State<Arc<StravaState>>,
   Extension(principal): Extension<Principal>,
   ApiQuery(query): ApiQuery<ActivitiesQuery>,
) -> Result<impl IntoResponse, BffError> {
   let activities = state
      .usecase
      .activities(&principal.user_id, query.days)
      .await?;

   let count = activities.len();
   let response = ApiResponse::new(
      ActivitiesPayload { activities, count },
      format!("Retrieved {count} activities"),
   );
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/strava/sync
#[utoipa::path(
   post,
   path = "/api/strava/sync",
   tag = "strava",
   security(("bearer_auth" = [])),
   request_body = SyncRequest,
   responses(
      (status = 200, description = "同期結果", body = ApiResponse<SyncPayload>),
      (status = 400, description = "days が範囲外", body = fitplan_shared::ErrorResponse),
      (status = 404, description = "Strava 未接続", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(days = req.days))]
pub async fn sync_strava_activities(
   State(state): State<Arc<StravaState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<SyncRequest>,
) -> Result<impl IntoResponse, BffError> {
   let summary = state.usecase.sync(&principal.user_id, req.days).await?;

   let message = format!(
      "Synced {} activities, skipped {} duplicates",
      summary.synced, summary.skipped
   );
   let response = ApiResponse::new(
      SyncPayload {
         sync_result: summary,
      },
      message,
   );
   Ok((StatusCode::OK, Json(response)))
}

/// POST /api/strava/create-activity
#[utoipa::path(
   post,
   path = "/api/strava/create-activity",
   tag = "strava",
   security(("bearer_auth" = [])),
   request_body = CreateActivityRequest,
   responses(
      (status = 200, description = "作成したアクティビティ", body = ApiResponse<ActivityPayload>),
      (status = 404, description = "ワークアウトがない、または Strava 未接続", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(workout_id = %req.workout_id))]
pub async fn create_strava_activity(
   State(state): State<Arc<StravaState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<CreateActivityRequest>,
) -> Result<impl IntoResponse, BffError> {
   let activity = state
      .usecase
      .create_activity(&principal.user_id, &WorkoutId::from_uuid(req.workout_id))
      .await?;

   let response = ApiResponse::new(
      ActivityPayload { activity },
      "Activity created on Strava successfully",
   );
   Ok((StatusCode::OK, Json(response)))
}

/// DELETE /api/strava/disconnect
#[utoipa::path(
   delete,
   path = "/api/strava/disconnect",
   tag = "strava",
   security(("bearer_auth" = [])),
   responses(
      (status = 200, description = "解除成功", body = ApiResponse<NoPayload>),
      (status = 404, description = "Strava 未接続", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn disconnect_strava(
   State(state): State<Arc<StravaState>>,
   Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, BffError> {
   state.usecase.disconnect(&principal.user_id).await?;

   let response = ApiResponse::new(NoPayload {}, "Strava disconnected successfully");
   Ok((StatusCode::OK, Json(response)))
}
