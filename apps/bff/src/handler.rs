//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュールで re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケースに委譲
//! - 呼び出し元は `require_auth` が extensions に格納した [`Principal`] から取得する
//!
//! ## ハンドラ一覧
//!
//! - `health`: ヘルスチェック
//! - `profile`: プロフィール・目標
//! - `workout` / `meal` / `tracking`: 記録系 CRUD
//! - `ai_workout` / `ai_meal`: LLM による生成
//! - `scheduler`: 日次・週次スケジュール
//! - `integration` / `strava`: 外部連携
//!
//! [`Principal`]: crate::client::Principal

pub mod ai_meal;
pub mod ai_workout;
pub mod health;
pub mod integration;
pub mod meal;
pub mod profile;
pub mod scheduler;
pub mod strava;
pub mod tracking;
pub mod workout;

pub use ai_meal::{
   AiMealState,
   create_daily_meal_plan,
   create_weekly_meal_plan,
   generate_and_save_meal,
   generate_meal,
   suggest_recipes,
};
pub use ai_workout::{
   AiWorkoutState,
   create_weekly_workout_plan,
   generate_and_save_workout,
   generate_workout,
   recommend_exercises,
};
pub use health::{ReadinessState, health_check, readiness_check};
pub use integration::{IntegrationState, disconnect_integration, list_integrations};
pub use meal::{MealState, create_meal, delete_meal, list_meals, update_meal};
pub use profile::{ProfileState, create_goal, get_profile, list_goals, update_profile};
pub use scheduler::{
   SchedulerState,
   create_daily_schedule,
   create_weekly_schedule,
   delete_schedule_item,
   get_schedule_range,
   update_schedule_item,
};
pub use strava::{
   StravaState,
   connect_strava,
   create_strava_activity,
   disconnect_strava,
   get_strava_activities,
   get_strava_stats,
   strava_callback,
   sync_strava_activities,
};
pub use tracking::{
   TrackingState,
   list_sleep,
   list_water,
   list_weight,
   record_sleep,
   record_water,
   record_weight,
};
pub use workout::{WorkoutState, create_workout, delete_workout, list_workouts, update_workout};

use chrono::{NaiveDate, NaiveTime};
use fitplan_domain::{
   DomainError,
   schedule,
   value_objects::{DateRange, ItemUpdate, Title},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{error::BffError, usecase::Preferences};

// --- 共通リクエスト型 ---

/// 日付範囲クエリ（両端とも省略可、両端含む）
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
   pub start_date: Option<NaiveDate>,
   pub end_date:   Option<NaiveDate>,
}

impl TryFrom<DateRangeQuery> for DateRange {
   type Error = DomainError;

   fn try_from(query: DateRangeQuery) -> Result<Self, Self::Error> {
      DateRange::new(query.start_date, query.end_date)
   }
}

/// ワークアウト・食事の部分更新リクエスト
///
/// 指定したフィールドだけを更新する。未知のフィールドは無視する。
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ItemUpdateRequest {
   pub title:          Option<String>,
   pub description:    Option<String>,
   pub completed:      Option<bool>,
   pub notes:          Option<String>,
   pub scheduled_date: Option<NaiveDate>,
   pub scheduled_time: Option<NaiveTime>,
}

impl TryFrom<ItemUpdateRequest> for ItemUpdate {
   type Error = DomainError;

   fn try_from(req: ItemUpdateRequest) -> Result<Self, Self::Error> {
      Ok(Self {
         title:          req.title.map(Title::new).transpose()?,
         description:    req.description,
         completed:      req.completed,
         notes:          req.notes,
         scheduled_date: req.scheduled_date,
         scheduled_time: req.scheduled_time,
      })
   }
}

/// 生成結果の保存先を指定するクエリ
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleSlotQuery {
   pub scheduled_date: NaiveDate,
   pub scheduled_time: Option<NaiveTime>,
}

/// 週間プランの既定の運動日数
fn default_days_per_week() -> u8 {
   schedule::DEFAULT_DAYS_PER_WEEK
}

/// 週間プランの運動日数を検証する（1〜7）
fn check_days_per_week(days_per_week: u8) -> Result<u8, BffError> {
   if (1..=7).contains(&days_per_week) {
      Ok(days_per_week)
   } else {
      Err(BffError::BadRequest(
         "days_per_week must be between 1 and 7".to_string(),
      ))
   }
}

// --- 共通レスポンス型 ---

/// 追加フィールドのないエンベロープ用ペイロード
#[derive(Debug, Serialize, ToSchema)]
pub struct NoPayload {}

/// リクエストボディを生成プロンプトの追加条件に変換する
fn to_preferences<T: Serialize>(value: &T) -> Result<Preferences, BffError> {
   match serde_json::to_value(value) {
      Ok(serde_json::Value::Object(map)) => Ok(map),
      Ok(_) => Ok(Preferences::new()),
      Err(e) => Err(BffError::Internal(format!(
         "追加条件を変換できません: {e}"
      ))),
   }
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;

   use super::*;

   #[test]
   fn test_item_update_requestの空タイトルはvalidationエラー() {
      let req = ItemUpdateRequest {
         title: Some(String::new()),
         ..Default::default()
      };

      assert!(matches!(
         ItemUpdate::try_from(req),
         Err(DomainError::Validation(_))
      ));
   }

   #[test]
   fn test_item_update_request_未指定のフィールドはnoneのまま() {
      let req: ItemUpdateRequest = serde_json::from_str(r#"{"completed": true}"#).unwrap();

      let update = ItemUpdate::try_from(req).unwrap();

      assert_eq!(
         update,
         ItemUpdate {
            completed: Some(true),
            ..Default::default()
         }
      );
   }

   #[test]
   fn test_date_range_query_開始日が終了日より後ならエラー() {
      let query = DateRangeQuery {
         start_date: NaiveDate::from_ymd_opt(2025, 3, 7),
         end_date:   NaiveDate::from_ymd_opt(2025, 3, 1),
      };

      assert!(DateRange::try_from(query).is_err());
   }

   #[test]
   fn test_check_days_per_week_範囲外はbad_request() {
      assert!(check_days_per_week(1).is_ok());
      assert!(check_days_per_week(7).is_ok());
      assert!(matches!(
         check_days_per_week(0),
         Err(BffError::BadRequest(_))
      ));
      assert!(matches!(
         check_days_per_week(8),
         Err(BffError::BadRequest(_))
      ));
   }
}
