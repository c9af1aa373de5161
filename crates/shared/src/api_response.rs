//! # API レスポンスエンベロープ
//!
//! 生成系・スケジューラ・外部連携 API の統一レスポンス形式
//! `{ "success": true, ...payload, "message": "..." }` を提供する。

use serde::{Deserialize, Serialize};

/// 生成系 API の統一レスポンス型
///
/// ペイロード `T` のフィールドはトップレベルに展開される（`serde(flatten)`）。
/// フロントエンドは `success` と `message` を共通に参照し、
/// ペイロードはエンドポイントごとのキー（`workout`, `schedule` 等）で受け取る。
///
/// ## 使用例
///
/// ```
/// use fitplan_shared::ApiResponse;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Payload {
///     count: usize,
/// }
///
/// let response = ApiResponse::new(Payload { count: 3 }, "3 件取得しました");
/// let json = serde_json::to_value(&response).unwrap();
/// assert_eq!(json["success"], true);
/// assert_eq!(json["count"], 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiResponse<T> {
   pub success: bool,
   #[serde(flatten)]
   pub data:    T,
   pub message: String,
}

impl<T> ApiResponse<T> {
   /// 成功レスポンスを作成する
   pub fn new(data: T, message: impl Into<String>) -> Self {
      Self {
         success: true,
         data,
         message: message.into(),
      }
   }
}

/// メッセージのみのレスポンス（削除系エンドポイント用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageResponse {
   pub message: String,
}

impl MessageResponse {
   pub fn new(message: impl Into<String>) -> Self {
      Self {
         message: message.into(),
      }
   }
}
