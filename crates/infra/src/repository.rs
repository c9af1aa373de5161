//! # リポジトリ実装
//!
//! ドメインエンティティの永続化を担当する。
//!
//! ## 設計方針
//!
//! - **トレイト + PostgreSQL 実装**: ユースケース層はトレイトに依存し、テストではモックに差し替える
//! - **RLS 二重防御**: 読み取りは [`UserConnection`](crate::db::UserConnection) 上で実行し、
//!   WHERE 句でも `user_id` を明示する
//! - **書き込みはトランザクション必須**: 書き込みメソッドは `&mut TxContext` を受け取る

pub mod dietary_preference_repository;
pub mod goal_repository;
pub mod integration_repository;
pub mod meal_repository;
pub mod profile_repository;
pub mod schedule_generation_repository;
pub mod tracking_repository;
pub mod workout_repository;

pub use dietary_preference_repository::{
   DietaryPreferenceRepository,
   PostgresDietaryPreferenceRepository,
};
pub use goal_repository::{GoalRepository, PostgresGoalRepository};
pub use integration_repository::{IntegrationRepository, PostgresIntegrationRepository};
pub use meal_repository::{MealRepository, PostgresMealRepository};
pub use profile_repository::{PostgresProfileRepository, ProfileRepository};
pub use schedule_generation_repository::{
   PostgresScheduleGenerationRepository,
   ScheduleGenerationRepository,
};
pub use tracking_repository::{PostgresTrackingRepository, TrackingRepository};
pub use workout_repository::{PostgresWorkoutRepository, WorkoutRepository};
