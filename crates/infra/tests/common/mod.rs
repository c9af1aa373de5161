//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用する ID・日時・エンティティ生成ヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use fitplan_domain::{
   integration::{
      ExternalIntegration,
      IntegrationId,
      IntegrationMetadata,
      OAuthTokens,
      Provider,
   },
   meal::{Meal, MealId, MealType, NewMeal},
   user::UserId,
   value_objects::Title,
   workout::{ExternalSource, NewWorkout, Workout, WorkoutId},
};
use sqlx::PgConnection;
use uuid::Uuid;

/// テスト用の固定日時
pub fn test_now() -> DateTime<Utc> {
   DateTime::from_timestamp(1_740_787_200, 0).unwrap() // 2025-03-01T00:00:00Z
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
   NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn new_user() -> UserId {
   UserId::from_uuid(Uuid::now_v7())
}

/// 予定日だけを指定したワークアウト
pub fn workout(user_id: &UserId, title: &str, scheduled_date: NaiveDate) -> Workout {
   NewWorkout::planned(Title::new(title).unwrap(), "cardio", scheduled_date).into_workout(
      WorkoutId::new(),
      user_id.clone(),
      test_now(),
   )
}

/// Strava 由来のワークアウト
pub fn synced_workout(user_id: &UserId, external_id: &str) -> Workout {
   let mut new = NewWorkout::planned(
      Title::new(format!("Activity {external_id}")).unwrap(),
      "cardio",
      date(2025, 3, 1),
   );
   new.completed = true;
   new.completed_at = Some(test_now());
   new.source = Some(ExternalSource {
      provider:    "strava".to_string(),
      external_id: external_id.to_string(),
   });
   new.into_workout(WorkoutId::new(), user_id.clone(), test_now())
}

pub fn meal(user_id: &UserId, meal_type: MealType, scheduled_date: NaiveDate) -> Meal {
   let mut new = NewMeal::planned(Title::new("Oatmeal").unwrap(), meal_type, scheduled_date);
   new.calories = Some(450);
   new.protein_g = Some(20.5);
   new.scheduled_time = Some(meal_type.default_time());
   new.ingredients = Some(serde_json::json!([{ "name": "oats", "amount": 80, "unit": "g" }]));
   new.into_meal(MealId::new(), user_id.clone(), test_now())
}

pub fn strava_integration(user_id: &UserId, access_token: &str) -> ExternalIntegration {
   ExternalIntegration::connect(
      IntegrationId::new(),
      user_id.clone(),
      Provider::Strava,
      OAuthTokens {
         access_token:  access_token.to_string(),
         refresh_token: format!("{access_token}-refresh"),
         expires_at:    test_now() + chrono::Duration::hours(6),
      },
      IntegrationMetadata {
         athlete_id:   Some(42),
         athlete_name: Some("Jane Runner".to_string()),
      },
      test_now(),
   )
}

pub fn seven_am() -> NaiveTime {
   NaiveTime::from_hms_opt(7, 0, 0).unwrap()
}

/// 非 superuser の fitplan_app ロールに切り替える
///
/// 本番はこのロールで接続するが、sqlx::test のプールは superuser のため
/// RLS を検証するテストでは SET ROLE で切り替える。
pub async fn set_app_role(conn: &mut PgConnection) {
   sqlx::query("SET ROLE fitplan_app")
      .execute(&mut *conn)
      .await
      .unwrap();
}

pub async fn reset_role(conn: &mut PgConnection) {
   sqlx::query("RESET ROLE").execute(&mut *conn).await.unwrap();
}
