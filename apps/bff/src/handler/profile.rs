//! # プロフィール API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/profile/me` - 本人のプロフィール（未作成なら初期作成）
//! - `PUT /api/profile/me` - プロフィールの部分更新
//! - `GET /api/profile/goals` - 目標一覧
//! - `POST /api/profile/goals` - 目標の作成

use std::sync::Arc;

use axum::{
   Extension,
   Json,
   extract::State,
   http::StatusCode,
   response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use fitplan_domain::{
   DomainError,
   goal::{Goal, GoalType, NewGoal},
   profile::{ActivityLevel, DisplayName, Gender, Profile, ProfileUpdate},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
   client::Principal,
   error::{ApiJson, BffError},
   usecase::ProfileUseCaseImpl,
};

/// プロフィール API の共有状態
pub struct ProfileState {
   pub usecase: Arc<ProfileUseCaseImpl>,
}

// --- リクエスト型 ---

/// プロフィール更新リクエスト（指定したフィールドだけを更新）
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
   pub display_name:   Option<String>,
   pub height_cm:      Option<i32>,
   pub weight_kg:      Option<f64>,
   pub age:            Option<i32>,
   pub gender:         Option<Gender>,
   pub activity_level: Option<ActivityLevel>,
}

impl TryFrom<UpdateProfileRequest> for ProfileUpdate {
   type Error = DomainError;

   fn try_from(req: UpdateProfileRequest) -> Result<Self, Self::Error> {
      Ok(Self {
         display_name:   req.display_name.map(DisplayName::new).transpose()?,
         height_cm:      req.height_cm,
         weight_kg:      req.weight_kg,
         age:            req.age,
         gender:         req.gender,
         activity_level: req.activity_level,
      })
   }
}

/// 目標作成リクエスト
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGoalRequest {
   /// 目標種別（例: `"Lose Weight"`, `"Build Muscle"`）
   pub goal_type:     String,
   pub target_value:  Option<f64>,
   pub current_value: Option<f64>,
   pub unit:          Option<String>,
   pub deadline:      Option<NaiveDate>,
}

impl TryFrom<CreateGoalRequest> for NewGoal {
   type Error = DomainError;

   fn try_from(req: CreateGoalRequest) -> Result<Self, Self::Error> {
      Ok(Self {
         goal_type:     GoalType::new(req.goal_type)?,
         target_value:  req.target_value,
         current_value: req.current_value,
         unit:          req.unit,
         deadline:      req.deadline,
      })
   }
}

// --- レスポンス型 ---

/// プロフィールデータ
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileData {
   pub id:             Uuid,
   pub email:          String,
   pub display_name:   Option<String>,
   pub height_cm:      Option<i32>,
   pub weight_kg:      Option<f64>,
   pub age:            Option<i32>,
   pub gender:         Option<Gender>,
   pub activity_level: Option<ActivityLevel>,
   pub created_at:     DateTime<Utc>,
   pub updated_at:     DateTime<Utc>,
}

impl From<Profile> for ProfileData {
   fn from(profile: Profile) -> Self {
      Self {
         id:             *profile.id().as_uuid(),
         email:          profile.email().as_str().to_string(),
         display_name:   profile.display_name().map(|n| n.as_str().to_string()),
         height_cm:      profile.height_cm(),
         weight_kg:      profile.weight_kg(),
         age:            profile.age(),
         gender:         profile.gender(),
         activity_level: profile.activity_level(),
         created_at:     profile.created_at(),
         updated_at:     profile.updated_at(),
      }
   }
}

/// 目標データ
#[derive(Debug, Serialize, ToSchema)]
pub struct GoalData {
   pub id:            Uuid,
   pub user_id:       Uuid,
   pub goal_type:     String,
   pub target_value:  Option<f64>,
   pub current_value: Option<f64>,
   pub unit:          Option<String>,
   pub deadline:      Option<NaiveDate>,
   pub created_at:    DateTime<Utc>,
   pub updated_at:    DateTime<Utc>,
}

impl From<Goal> for GoalData {
   fn from(goal: Goal) -> Self {
      Self {
         id:            *goal.id.as_uuid(),
         user_id:       *goal.user_id.as_uuid(),
         goal_type:     goal.goal_type,
         target_value:  goal.target_value,
         current_value: goal.current_value,
         unit:          goal.unit,
         deadline:      goal.deadline,
         created_at:    goal.created_at,
         updated_at:    goal.updated_at,
      }
   }
}

// --- ハンドラ ---

/// GET /api/profile/me
///
/// 初回アクセス時は ID プロバイダのメールアドレスでプロフィールを作成する。
#[utoipa::path(
   get,
   path = "/api/profile/me",
   tag = "profile",
   security(("bearer_auth" = [])),
   responses(
      (status = 200, description = "プロフィール", body = ProfileData),
      (status = 401, description = "認証エラー", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(
   State(state): State<Arc<ProfileState>>,
   Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, BffError> {
   let profile = state
      .usecase
      .get_or_provision(&principal.user_id, &principal.email)
      .await?;

   Ok((StatusCode::OK, Json(ProfileData::from(profile))))
}

/// PUT /api/profile/me
#[utoipa::path(
   put,
   path = "/api/profile/me",
   tag = "profile",
   security(("bearer_auth" = [])),
   request_body = UpdateProfileRequest,
   responses(
      (status = 200, description = "更新後のプロフィール", body = ProfileData),
      (status = 400, description = "値が範囲外", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
   State(state): State<Arc<ProfileState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, BffError> {
   let profile = state
      .usecase
      .update_profile(&principal.user_id, &principal.email, req.try_into()?)
      .await?;

   Ok((StatusCode::OK, Json(ProfileData::from(profile))))
}

/// GET /api/profile/goals
#[utoipa::path(
   get,
   path = "/api/profile/goals",
   tag = "profile",
   security(("bearer_auth" = [])),
   responses(
      (status = 200, description = "目標一覧", body = Vec<GoalData>)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn list_goals(
   State(state): State<Arc<ProfileState>>,
   Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, BffError> {
   let goals = state.usecase.list_goals(&principal.user_id).await?;

   let items: Vec<GoalData> = goals.into_iter().map(GoalData::from).collect();
   Ok((StatusCode::OK, Json(items)))
}

/// POST /api/profile/goals
#[utoipa::path(
   post,
   path = "/api/profile/goals",
   tag = "profile",
   security(("bearer_auth" = [])),
   request_body = CreateGoalRequest,
   responses(
      (status = 200, description = "作成した目標", body = GoalData),
      (status = 400, description = "目標種別が不正", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn create_goal(
   State(state): State<Arc<ProfileState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<CreateGoalRequest>,
) -> Result<impl IntoResponse, BffError> {
   let goal = state
      .usecase
      .create_goal(&principal.user_id, req.try_into()?)
      .await?;

   Ok((StatusCode::OK, Json(GoalData::from(goal))))
}
