//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用する。JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: [`event::category`] の定数
/// - `event.action`: [`event::action`] の定数
/// - `event.user_id`: 操作したユーザー ID
/// - `event.result`: [`event::result`] の定数
#[macro_export]
macro_rules! log_business_event {
   ($($args:tt)*) => {
      ::tracing::info!(
         event.kind = "business_event",
         $($args)*
      )
   };
}

/// イベントフィールドの定数
pub mod event {
   pub mod category {
      pub const SCHEDULE: &str = "schedule";
      pub const GENERATION: &str = "generation";
      pub const INTEGRATION: &str = "integration";
   }

   pub mod action {
      // スケジュール
      pub const DAILY_SCHEDULE_GENERATED: &str = "schedule.daily_generated";
      pub const WEEKLY_SCHEDULE_GENERATED: &str = "schedule.weekly_generated";

      // 生成
      pub const WORKOUT_SAVED: &str = "generation.workout_saved";
      pub const MEAL_SAVED: &str = "generation.meal_saved";

      // 外部連携
      pub const STRAVA_CONNECTED: &str = "integration.strava_connected";
      pub const STRAVA_DISCONNECTED: &str = "integration.strava_disconnected";
      pub const STRAVA_TOKEN_REFRESHED: &str = "integration.strava_token_refreshed";
      pub const STRAVA_SYNCED: &str = "integration.strava_synced";
      pub const STRAVA_ACTIVITY_PUSHED: &str = "integration.strava_activity_pushed";
      pub const INTEGRATION_DISCONNECTED: &str = "integration.disconnected";
   }

   pub mod entity_type {
      pub const WORKOUT: &str = "workout";
      pub const MEAL: &str = "meal";
      pub const SCHEDULE_GENERATION: &str = "schedule_generation";
      pub const INTEGRATION: &str = "external_integration";
   }

   pub mod result {
      pub const SUCCESS: &str = "success";
      pub const FAILURE: &str = "failure";
   }
}

/// エラーコンテキストフィールドの定数
pub mod error {
   pub mod category {
      /// インフラストラクチャ（DB）
      pub const INFRASTRUCTURE: &str = "infrastructure";
      /// 外部サービス呼び出し（ID プロバイダ、LLM、Strava）
      pub const EXTERNAL_SERVICE: &str = "external_service";
   }

   pub mod kind {
      pub const DATABASE: &str = "database";
      pub const SERIALIZATION: &str = "serialization";
      pub const IDENTITY: &str = "identity";
      pub const LLM: &str = "llm";
      pub const GENERATION_SCHEMA: &str = "generation_schema";
      pub const STRAVA: &str = "strava";
      pub const INTERNAL: &str = "internal";
   }
}
