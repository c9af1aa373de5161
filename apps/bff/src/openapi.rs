//! # OpenAPI 仕様定義
//!
//! utoipa を使用して BFF の OpenAPI 仕様を Rust の型から自動生成する。
//! `ApiDoc::openapi()` で OpenAPI ドキュメントを取得できる。

use utoipa::{
   Modify,
   OpenApi,
   openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::handler::{
   ai_meal,
   ai_workout,
   health,
   integration,
   meal,
   profile,
   scheduler,
   strava,
   tracking,
   workout,
};

#[derive(OpenApi)]
#[openapi(
   info(
      title = "FitPlan API",
      version = "0.1.0",
      description = "フィットネス・栄養管理アプリ FitPlan の BFF API"
   ),
   paths(
      // health
      health::health_check,
      health::readiness_check,
      // profile
      profile::get_profile,
      profile::update_profile,
      profile::list_goals,
      profile::create_goal,
      // workouts
      workout::list_workouts,
      workout::create_workout,
      workout::update_workout,
      workout::delete_workout,
      // meals
      meal::list_meals,
      meal::create_meal,
      meal::update_meal,
      meal::delete_meal,
      // tracking
      tracking::list_sleep,
      tracking::record_sleep,
      tracking::list_weight,
      tracking::record_weight,
      tracking::list_water,
      tracking::record_water,
      // ai-workouts
      ai_workout::generate_workout,
      ai_workout::generate_and_save_workout,
      ai_workout::create_weekly_workout_plan,
      ai_workout::recommend_exercises,
      // ai-meals
      ai_meal::generate_meal,
      ai_meal::generate_and_save_meal,
      ai_meal::create_daily_meal_plan,
      ai_meal::create_weekly_meal_plan,
      ai_meal::suggest_recipes,
      // scheduler
      scheduler::create_daily_schedule,
      scheduler::create_weekly_schedule,
      scheduler::get_schedule_range,
      scheduler::update_schedule_item,
      scheduler::delete_schedule_item,
      // integrations
      integration::list_integrations,
      integration::disconnect_integration,
      // strava
      strava::connect_strava,
      strava::strava_callback,
      strava::get_strava_stats,
      strava::get_strava_activities,
      strava::sync_strava_activities,
      strava::create_strava_activity,
      strava::disconnect_strava,
   ),
   components(schemas(
      fitplan_shared::ErrorResponse,
   )),
   tags(
      (name = "health", description = "ヘルスチェック"),
      (name = "profile", description = "プロフィール・目標"),
      (name = "workouts", description = "ワークアウト記録"),
      (name = "meals", description = "食事記録"),
      (name = "tracking", description = "睡眠・体重・水分の記録"),
      (name = "ai-workouts", description = "AI によるワークアウト生成"),
      (name = "ai-meals", description = "AI による献立生成"),
      (name = "scheduler", description = "日次・週次スケジュール"),
      (name = "integrations", description = "外部連携"),
      (name = "strava", description = "Strava 連携"),
   ),
   modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// セキュリティスキーム定義
///
/// ID プロバイダが発行したアクセストークンによる Bearer 認証を追加する。
struct SecurityAddon;

impl Modify for SecurityAddon {
   fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
      let components = openapi.components.get_or_insert_default();
      components.add_security_scheme(
         "bearer_auth",
         SecurityScheme::Http(
            HttpBuilder::new()
               .scheme(HttpAuthScheme::Bearer)
               .bearer_format("JWT")
               .build(),
         ),
      );
   }
}
