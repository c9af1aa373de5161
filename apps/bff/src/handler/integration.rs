//! # 外部連携 API ハンドラ
//!
//! 連携一覧はトークンを含めずに返す。
//!
//! ## エンドポイント
//!
//! - `GET /api/integrations` - 連携一覧
//! - `DELETE /api/integrations/{id}` - 連携の解除

use std::sync::Arc;

use axum::{
   Extension,
   Json,
   extract::State,
   http::StatusCode,
   response::IntoResponse,
};
use chrono::{DateTime, Utc};
use fitplan_domain::integration::{ExternalIntegration, IntegrationId};
use fitplan_shared::MessageResponse;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
   client::Principal,
   error::{ApiPath, BffError},
   usecase::IntegrationUseCaseImpl,
};

/// 外部連携 API の共有状態
pub struct IntegrationState {
   pub usecase: Arc<IntegrationUseCaseImpl>,
}

/// 連携データ（トークンは含まない）
#[derive(Debug, Serialize, ToSchema)]
pub struct IntegrationData {
   pub id:             Uuid,
   /// 連携先（例: `strava`）
   pub provider:       String,
   pub connected_at:   DateTime<Utc>,
   pub last_synced_at: Option<DateTime<Utc>>,
   pub is_active:      bool,
}

impl From<&ExternalIntegration> for IntegrationData {
   fn from(integration: &ExternalIntegration) -> Self {
      Self {
         id:             *integration.id().as_uuid(),
         provider:       integration.provider().to_string(),
         connected_at:   integration.connected_at(),
         last_synced_at: integration.last_synced_at(),
         is_active:      integration.is_active(),
      }
   }
}

/// GET /api/integrations
#[utoipa::path(
   get,
   path = "/api/integrations",
   tag = "integrations",
   security(("bearer_auth" = [])),
   responses(
      (status = 200, description = "連携一覧", body = Vec<IntegrationData>)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn list_integrations(
   State(state): State<Arc<IntegrationState>>,
   Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, BffError> {
   let integrations = state.usecase.list(&principal.user_id).await?;

   let items: Vec<IntegrationData> = integrations.iter().map(IntegrationData::from).collect();
   Ok((StatusCode::OK, Json(items)))
}

/// DELETE /api/integrations/{id}
#[utoipa::path(
   delete,
   path = "/api/integrations/{id}",
   tag = "integrations",
   security(("bearer_auth" = [])),
   params(("id" = Uuid, Path, description = "連携 ID")),
   responses(
      (status = 200, description = "解除成功", body = MessageResponse),
      (status = 404, description = "連携が見つからない", body = fitplan_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all, fields(%id))]
pub async fn disconnect_integration(
   State(state): State<Arc<IntegrationState>>,
   Extension(principal): Extension<Principal>,
   ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, BffError> {
   state
      .usecase
      .disconnect(&principal.user_id, &IntegrationId::from_uuid(id))
      .await?;

   Ok((
      StatusCode::OK,
      Json(MessageResponse::new("Integration disconnected successfully")),
   ))
}
