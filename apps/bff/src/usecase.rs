//! # ユースケース層
//!
//! BFF のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・外部クライアント・時計を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `profile` / `workout` / `meal` / `tracking` / `integration`: 本人スコープの CRUD
//! - `workout_generator` / `meal_planner`: LLM による生成
//! - `scheduler`: 日次・週次スケジュールの組み立て
//! - `strava`: Strava OAuth と同期

pub(crate) mod helpers;
mod prompt;
#[cfg(test)]
pub(crate) mod test_support;

pub mod generation;
pub mod integration;
pub mod meal;
pub mod meal_planner;
pub mod profile;
pub mod scheduler;
pub mod strava;
pub mod tracking;
pub mod workout;
pub mod workout_generator;

pub use generation::{GenerationError, Preferences, UserContext, UserContextLoader};
pub use integration::IntegrationUseCaseImpl;
pub use meal::MealUseCaseImpl;
pub use meal_planner::MealPlannerUseCaseImpl;
pub use profile::ProfileUseCaseImpl;
pub use scheduler::{
   DailySchedule,
   ScheduleItem,
   SchedulerUseCaseImpl,
   WeeklySchedule,
   WeeklyScheduleDay,
};
pub use strava::{ACTIVITY_DAYS_RANGE, AthleteStats, DEFAULT_ACTIVITY_DAYS, StravaUseCaseImpl};
pub use tracking::TrackingUseCaseImpl;
pub use workout::WorkoutUseCaseImpl;
pub use workout_generator::WorkoutGeneratorUseCaseImpl;
