//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! BFF のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は BFF の責務（shared に axum 依存を入れない）
//! - `detail` にはクライアントに表示するメッセージを格納する
//!   （500 系も含め、失敗理由の文字列をそのまま載せる）

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://fitplan.example.com/errors";

/// エラーレスポンス（RFC 9457 Problem Details）
///
/// `type` フィールドは URI で問題の種類を識別する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
   #[serde(rename = "type")]
   pub error_type: String,
   pub title:      String,
   pub status:     u16,
   pub detail:     String,
}

impl ErrorResponse {
   /// 汎用コンストラクタ
   ///
   /// `error_type_suffix` はベース URI に付加される（例: `"generation-failed"`）。
   pub fn new(
      error_type_suffix: &str,
      title: impl Into<String>,
      status: u16,
      detail: impl Into<String>,
   ) -> Self {
      Self {
         error_type: format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
         title: title.into(),
         status,
         detail: detail.into(),
      }
   }

   /// 400 Bad Request
   pub fn bad_request(detail: impl Into<String>) -> Self {
      Self::new("bad-request", "Bad Request", 400, detail)
   }

   /// 401 Unauthorized
   pub fn unauthorized(detail: impl Into<String>) -> Self {
      Self::new("unauthorized", "Unauthorized", 401, detail)
   }

   /// 404 Not Found
   pub fn not_found(detail: impl Into<String>) -> Self {
      Self::new("not-found", "Not Found", 404, detail)
   }

   /// 500 Internal Server Error
   pub fn internal_error(detail: impl Into<String>) -> Self {
      Self::new("internal-error", "Internal Server Error", 500, detail)
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_new_で全フィールドが正しく設定される() {
      let error = ErrorResponse::new("generation-failed", "Generation Failed", 500, "生成失敗");

      assert_eq!(
         error.error_type,
         "https://fitplan.example.com/errors/generation-failed"
      );
      assert_eq!(error.title, "Generation Failed");
      assert_eq!(error.status, 500);
      assert_eq!(error.detail, "生成失敗");
   }

   #[test]
   fn test_not_found_が404と正しいerror_typeを返す() {
      let error = ErrorResponse::not_found("ワークアウトが見つかりません");

      assert_eq!(
         error.error_type,
         "https://fitplan.example.com/errors/not-found"
      );
      assert_eq!(error.title, "Not Found");
      assert_eq!(error.status, 404);
      assert_eq!(error.detail, "ワークアウトが見つかりません");
   }

   #[test]
   fn test_internal_error_がdetailをそのまま保持する() {
      let error = ErrorResponse::internal_error("ワークアウト生成に失敗しました: timeout");

      assert_eq!(error.status, 500);
      assert_eq!(error.detail, "ワークアウト生成に失敗しました: timeout");
   }

   #[test]
   fn test_jsonシリアライズでtypeフィールド名が正しい() {
      let error = ErrorResponse::bad_request("不正なリクエスト");
      let json = serde_json::to_value(&error).unwrap();

      // serde(rename = "type") で `error_type` → `type` に変換される
      assert_eq!(json["type"], "https://fitplan.example.com/errors/bad-request");
      assert_eq!(json["title"], "Bad Request");
      assert_eq!(json["status"], 400);
      assert_eq!(json["detail"], "不正なリクエスト");
      assert!(json.get("error_type").is_none());
   }

   #[test]
   fn test_全便利コンストラクタのstatusが正しい() {
      assert_eq!(ErrorResponse::bad_request("").status, 400);
      assert_eq!(ErrorResponse::unauthorized("").status, 401);
      assert_eq!(ErrorResponse::not_found("").status, 404);
      assert_eq!(ErrorResponse::internal_error("").status, 500);
   }
}
