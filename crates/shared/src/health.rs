//! # ヘルスチェック型
//!
//! BFF の liveness（`/health`）と readiness（`/health/ready`）エンドポイントで
//! 使用されるレスポンス型を提供する。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// liveness レスポンス
///
/// `status` はプロセスの稼働状態、`version` は Cargo.toml のバージョンを示す。
///
/// ```
/// use fitplan_shared::HealthResponse;
///
/// let response = HealthResponse::healthy("0.1.0");
/// assert_eq!(response.status, "healthy");
/// ```
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
   /// 稼働状態（常に `"healthy"`）
   pub status:  String,
   /// アプリケーションバージョン
   pub version: String,
}

impl HealthResponse {
   pub fn healthy(version: impl Into<String>) -> Self {
      Self {
         status:  "healthy".to_string(),
         version: version.into(),
      }
   }
}

/// 個別チェックの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum CheckStatus {
   Ok,
   Error,
}

/// readiness 全体のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ReadinessStatus {
   /// 全依存先が利用可能
   Ready,
   /// いずれかの依存先が利用不可
   NotReady,
}

/// readiness レスポンス
///
/// 依存先（データベース、ID プロバイダ）ごとのチェック結果を持つ。
/// キーは出力順を安定させるため `BTreeMap` で保持する。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReadinessResponse {
   pub status: ReadinessStatus,
   pub checks: BTreeMap<String, CheckStatus>,
}

impl ReadinessResponse {
   /// 個別チェック結果から全体ステータスを導出する
   ///
   /// 1 つでも `Error` があれば `NotReady`。
   pub fn from_checks<I, K>(checks: I) -> Self
   where
      I: IntoIterator<Item = (K, CheckStatus)>,
      K: Into<String>,
   {
      let checks: BTreeMap<String, CheckStatus> =
         checks.into_iter().map(|(k, v)| (k.into(), v)).collect();
      let status = if checks.values().all(|s| *s == CheckStatus::Ok) {
         ReadinessStatus::Ready
      } else {
         ReadinessStatus::NotReady
      };
      Self { status, checks }
   }

   pub fn is_ready(&self) -> bool {
      self.status == ReadinessStatus::Ready
   }
}
