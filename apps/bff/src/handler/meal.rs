//! # 食事 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/meals` - 一覧（`start_date` / `end_date` で絞り込み）
//! - `POST /api/meals` - 作成
//! - `PATCH /api/meals/{id}` - 部分更新
//! - `DELETE /api/meals/{id}` - 削除

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
   meal::{Meal, MealId, MealType, NewMeal},
   value_objects::Title,
};
use fitplan_shared::MessageResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{DateRangeQuery, ItemUpdateRequest};
use crate::{
   client::Principal,
   error::{ApiJson, ApiPath, ApiQuery, BffError},
   usecase::MealUseCaseImpl,
};

/// 食事 API の共有状態
pub struct MealState {
   pub usecase: Arc<MealUseCaseImpl>,
}

// --- リクエスト型 ---

/// 食事作成リクエスト
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMealRequest {
   pub title:          String,
   pub description:    Option<String>,
   pub meal_type:      MealType,
   pub calories:       Option<i32>,
   pub protein_g:      Option<f64>,
   pub carbs_g:        Option<f64>,
   pub fat_g:          Option<f64>,
   #[schema(value_type = Option<Object>)]
   pub ingredients:    Option<serde_json::Value>,
   pub recipe_url:     Option<String>,
   pub scheduled_date: NaiveDate,
   pub scheduled_time: Option<NaiveTime>,
   pub notes:          Option<String>,
}

impl TryFrom<CreateMealRequest> for NewMeal {
   type Error = DomainError;

   fn try_from(req: CreateMealRequest) -> Result<Self, Self::Error> {
      Ok(Self {
         title:          Title::new(req.title)?,
         description:    req.description,
         meal_type:      req.meal_type,
         calories:       req.calories,
         protein_g:      req.protein_g,
         carbs_g:        req.carbs_g,
         fat_g:          req.fat_g,
         ingredients:    req.ingredients,
         recipe_url:     req.recipe_url,
         scheduled_date: req.scheduled_date,
         scheduled_time: req.scheduled_time,
         notes:          req.notes,
      })
   }
}

// --- レスポンス型 ---

/// 食事データ
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MealData {
   pub id:             Uuid,
   pub user_id:        Uuid,
   pub title:          String,
   pub description:    Option<String>,
   pub meal_type:      MealType,
   pub calories:       Option<i32>,
   pub protein_g:      Option<f64>,
   pub carbs_g:        Option<f64>,
   pub fat_g:          Option<f64>,
   #[schema(value_type = Option<Object>)]
   pub ingredients:    Option<serde_json::Value>,
   pub recipe_url:     Option<String>,
   pub scheduled_date: NaiveDate,
   pub scheduled_time: Option<NaiveTime>,
   pub notes:          Option<String>,
   pub completed:      bool,
   pub completed_at:   Option<DateTime<Utc>>,
   pub created_at:     DateTime<Utc>,
   pub updated_at:     DateTime<Utc>,
}

impl From<Meal> for MealData {
   fn from(meal: Meal) -> Self {
      Self {
         id:             *meal.id.as_uuid(),
         user_id:        *meal.user_id.as_uuid(),
         title:          meal.title,
         description:    meal.description,
         meal_type:      meal.meal_type,
         calories:       meal.calories,
         protein_g:      meal.protein_g,
         carbs_g:        meal.carbs_g,
         fat_g:          meal.fat_g,
         ingredients:    meal.ingredients,
         recipe_url:     meal.recipe_url,
         scheduled_date: meal.scheduled_date,
         scheduled_time: meal.scheduled_time,
         notes:          meal.notes,
         completed:      meal.completed,
         completed_at:   meal.completed_at,
         created_at:     meal.created_at,
         updated_at:     meal.updated_at,
      }
   }
}

// --- ハンドラ ---

/// GET /api/meals
#[utoipa::path(
   get,
   path = "/api/meals",
   tag = "meals",
   security(("bearer_auth" = [])),
   params(DateRangeQuery),
   responses(
      (status = 200, description = "食事一覧", body = Vec<MealData>),
      (status = 400, description = "日付範囲が不正", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn list_meals(
   State(state): State<Arc<MealState>>,
   Extension(principal): Extension<Principal>,
   ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<impl IntoResponse, BffError> {
   let meals = state
      .usecase
      .list(&principal.user_id, &query.try_into()?)
      .await?;

   let items: Vec<MealData> = meals.into_iter().map(MealData::from).collect();
   Ok((StatusCode::OK, Json(items)))
}

/// POST /api/meals
#[utoipa::path(
   post,
   path = "/api/meals",
   tag = "meals",
   security(("bearer_auth" = [])),
   request_body = CreateMealRequest,
   responses(
      (status = 200, description = "作成した食事", body = MealData),
      (status = 400, description = "バリデーションエラー", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn create_meal(
   State(state): State<Arc<MealState>>,
   Extension(principal): Extension<Principal>,
   ApiJson(req): ApiJson<CreateMealRequest>,
) -> Result<impl IntoResponse, BffError> {
   let meal = state
      .usecase
      .create(&principal.user_id, req.try_into()?)
      .await?;

   Ok((StatusCode::OK, Json(MealData::from(meal))))
}

/// PATCH /api/meals/{id}
#[utoipa::path(
   patch,
   path = "/api/meals/{id}",
   tag = "meals",
   security(("bearer_auth" = [])),
   params(("id" = Uuid, Path, description = "食事 ID")),
   request_body = ItemUpdateRequest,
   responses(
      (status = 200, description = "更新後の食事", body = MealData),
      (status = 400, description = "更新するフィールドがない", body = fitplan_shared::ErrorResponse),
      (status = 404, description = "食事が見つからない", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(%id))]
pub async fn update_meal(
   State(state): State<Arc<MealState>>,
   Extension(principal): Extension<Principal>,
   ApiPath(id): ApiPath<Uuid>,
   ApiJson(req): ApiJson<ItemUpdateRequest>,
) -> Result<impl IntoResponse, BffError> {
   let meal = state
      .usecase
      .update(&principal.user_id, &MealId::from_uuid(id), req.try_into()?)
      .await?;

   Ok((StatusCode::OK, Json(MealData::from(meal))))
}

/// DELETE /api/meals/{id}
#[utoipa::path(
   delete,
   path = "/api/meals/{id}",
   tag = "meals",
   security(("bearer_auth" = [])),
   params(("id" = Uuid, Path, description = "食事 ID")),
   responses(
      (status = 200, description = "削除成功", body = MessageResponse),
      (status = 404, description = "食事が見つからない", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_meal(
   State(state): State<Arc<MealState>>,
   Extension(principal): Extension<Principal>,
   ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, BffError> {
   state
      .usecase
      .delete(&principal.user_id, &MealId::from_uuid(id))
      .await?;

   Ok((
      StatusCode::OK,
      Json(MessageResponse::new("Meal deleted successfully")),
   ))
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;

   use super::*;

   #[test]
   fn test_create_meal_request_食事区分はスネークケースで受け付ける() {
      let req: CreateMealRequest = serde_json::from_value(serde_json::json!({
         "title": "Oatmeal",
         "meal_type": "breakfast",
         "calories": 420,
         "scheduled_date": "2025-03-01"
      }))
      .unwrap();

      let meal = NewMeal::try_from(req).unwrap();

      assert_eq!(meal.meal_type, MealType::Breakfast);
      assert_eq!(meal.calories, Some(420));
   }

   #[test]
   fn test_create_meal_request_未知の食事区分はデシリアライズエラー() {
      let result = serde_json::from_value::<CreateMealRequest>(serde_json::json!({
         "title": "Brunch",
         "meal_type": "brunch",
         "scheduled_date": "2025-03-01"
      }));

      assert!(result.is_err());
   }
}
