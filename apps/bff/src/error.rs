//! # BFF エラーハンドリング
//!
//! HTTP API のエラー定義と、axum レスポンスへの変換。
//!
//! | バリアント | ステータス | 用途 |
//! |-----------|-----------|------|
//! | `Unauthorized` | 401 | 資格情報がない・検証できない |
//! | `NotFound` | 404 | 所有者スコープで行が見つからない |
//! | `BadRequest` | 400 | リクエストの形式・値の不正 |
//! | `Database` / `Generation` / `Strava` / `Internal` | 500 | 依存先の失敗 |
//!
//! 500 系はエラー文言を `detail` にそのまま載せ、`error.category` /
//! `error.kind` 付きで `tracing::error!` に記録する。

use axum::{
   Json,
   extract::{
      FromRequest,
      FromRequestParts,
      rejection::{JsonRejection, PathRejection, QueryRejection},
   },
   http::StatusCode,
   response::{IntoResponse, Response},
};
use fitplan_domain::DomainError;
use fitplan_infra::{InfraError, InfraErrorKind};
use fitplan_shared::{
   ErrorResponse,
   event_log::error::{category, kind},
};
use thiserror::Error;

use crate::{client::StravaError, usecase::GenerationError};

/// BFF で発生するエラー
#[derive(Debug, Error)]
pub enum BffError {
   /// 認証されていない
   #[error("認証が必要です")]
   Unauthorized,

   /// リソースが見つからない
   #[error("{0}")]
   NotFound(String),

   /// 不正なリクエスト
   #[error("{0}")]
   BadRequest(String),

   /// データベースエラー
   #[error("データベースエラー: {0}")]
   Database(#[from] InfraError),

   /// 生成エラー（LLM 呼び出し・スキーマ検証）
   #[error("生成に失敗しました: {0}")]
   Generation(#[from] GenerationError),

   /// Strava API エラー
   #[error("Strava API エラー: {0}")]
   Strava(#[from] StravaError),

   /// 内部エラー
   #[error("内部エラー: {0}")]
   Internal(String),
}

impl From<DomainError> for BffError {
   fn from(e: DomainError) -> Self {
      match e {
         DomainError::Validation(msg) => Self::BadRequest(msg),
         DomainError::NotFound { entity_type, .. } => {
            Self::NotFound(format!("{entity_type} not found"))
         }
      }
   }
}

impl From<JsonRejection> for BffError {
   fn from(rejection: JsonRejection) -> Self {
      Self::BadRequest(rejection.body_text())
   }
}

impl From<QueryRejection> for BffError {
   fn from(rejection: QueryRejection) -> Self {
      Self::BadRequest(rejection.body_text())
   }
}

impl From<PathRejection> for BffError {
   fn from(rejection: PathRejection) -> Self {
      Self::BadRequest(rejection.body_text())
   }
}

fn infra_error_kind(error: &InfraError) -> &'static str {
   match error.kind() {
      InfraErrorKind::Database(_) => kind::DATABASE,
      InfraErrorKind::Serialization(_) => kind::SERIALIZATION,
      InfraErrorKind::Unexpected(_) => kind::INTERNAL,
   }
}

impl IntoResponse for BffError {
   fn into_response(self) -> Response {
      let body = match &self {
         BffError::Unauthorized => ErrorResponse::unauthorized("Could not validate credentials"),
         BffError::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
         BffError::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
         BffError::Database(e) => {
            tracing::error!(
               error.category = category::INFRASTRUCTURE,
               error.kind = infra_error_kind(e),
               span_trace = %e.span_trace(),
               "データベースエラー: {}",
               e
            );
            ErrorResponse::internal_error(self.to_string())
         }
         BffError::Generation(e) => {
            let error_kind = match e {
               GenerationError::Llm(_) => kind::LLM,
               GenerationError::Schema(_) | GenerationError::Artifact(_) => {
                  kind::GENERATION_SCHEMA
               }
            };
            tracing::error!(
               error.category = category::EXTERNAL_SERVICE,
               error.kind = error_kind,
               "生成エラー: {}",
               e
            );
            ErrorResponse::internal_error(self.to_string())
         }
         BffError::Strava(e) => {
            tracing::error!(
               error.category = category::EXTERNAL_SERVICE,
               error.kind = kind::STRAVA,
               "Strava API エラー: {}",
               e
            );
            ErrorResponse::internal_error(self.to_string())
         }
         BffError::Internal(msg) => {
            tracing::error!(
               error.category = category::INFRASTRUCTURE,
               error.kind = kind::INTERNAL,
               "内部エラー: {}",
               msg
            );
            ErrorResponse::internal_error(self.to_string())
         }
      };

      let status =
         StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
      (status, Json(body)).into_response()
   }
}

// --- 抽出器 ---
//
// axum 標準の抽出器は拒否時にプレーンテキストを返すため、
// 拒否を BffError（problem details）に変換するラッパーを使う。

/// JSON ボディ抽出器
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(BffError))]
pub struct ApiJson<T>(pub T);

/// クエリ文字列抽出器
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(BffError))]
pub struct ApiQuery<T>(pub T);

/// パスパラメータ抽出器
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(BffError))]
pub struct ApiPath<T>(pub T);
