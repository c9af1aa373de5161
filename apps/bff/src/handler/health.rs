//! # ヘルスチェックハンドラ
//!
//! BFF の稼働状態を確認するためのエンドポイント。認証不要。
//!
//! - `/health` — Liveness Check（常に `"healthy"` を返す）
//! - `/health/ready` — Readiness Check（DB / ID プロバイダの接続状態を確認）
//!
//! レスポンス型は [`fitplan_shared::HealthResponse`] / [`fitplan_shared::ReadinessResponse`] を参照。

use std::{sync::Arc, time::Duration};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use fitplan_infra::db;
use fitplan_shared::{CheckStatus, HealthResponse, ReadinessResponse};
use sqlx::PgPool;

use crate::client::IdentityClient;

/// 個別チェックのタイムアウト
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// BFF のヘルスチェックエンドポイント
#[utoipa::path(
   get,
   path = "/health",
   tag = "health",
   responses(
      (status = 200, description = "サーバー稼働中", body = HealthResponse)
   )
)]
pub async fn health_check() -> Json<HealthResponse> {
   Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}

/// Readiness Check 用の State
pub struct ReadinessState {
   pub pool:     PgPool,
   pub identity: Arc<dyn IdentityClient>,
}

/// BFF の Readiness Check エンドポイント
///
/// DB と ID プロバイダの接続状態を並行チェックする。
/// 全チェック OK → 200、1 つでも失敗 → 503。
#[utoipa::path(
   get,
   path = "/health/ready",
   tag = "health",
   responses(
      (status = 200, description = "全依存サービス稼働中", body = ReadinessResponse),
      (status = 503, description = "一部の依存サービスが利用不可", body = ReadinessResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
   let (database, identity) = tokio::join!(
      check_database(&state.pool),
      check_identity(state.identity.as_ref()),
   );

   let response =
      ReadinessResponse::from_checks([("database", database), ("identity_provider", identity)]);
   let status = if response.is_ready() {
      StatusCode::OK
   } else {
      StatusCode::SERVICE_UNAVAILABLE
   };

   (status, Json(response))
}

/// DB に `SELECT 1` を発行して確認する
async fn check_database(pool: &PgPool) -> CheckStatus {
   match tokio::time::timeout(CHECK_TIMEOUT, db::ping(pool)).await {
      Ok(Ok(())) => CheckStatus::Ok,
      Ok(Err(e)) => {
         tracing::warn!(error = %e, "readiness check: database ping failed");
         CheckStatus::Error
      }
      Err(_) => {
         tracing::warn!("readiness check: database check timed out");
         CheckStatus::Error
      }
   }
}

async fn check_identity(identity: &dyn IdentityClient) -> CheckStatus {
   match tokio::time::timeout(CHECK_TIMEOUT, identity.is_healthy()).await {
      Ok(true) => CheckStatus::Ok,
      Ok(false) => CheckStatus::Error,
      Err(_) => {
         tracing::warn!("readiness check: identity provider check timed out");
         CheckStatus::Error
      }
   }
}
