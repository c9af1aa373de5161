//! # FitPlan ドメイン層
//!
//! プロフィール・ワークアウト・食事・健康記録・外部連携・スケジュールの
//! ドメインモデルと、エネルギー計算や生成結果スキーマなどの純粋なロジックを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! bff → infra → domain
//! ```
//!
//! ドメイン層は DB や HTTP クライアントに一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`profile`], [`goal`], [`dietary`] - 生成のコンテキストになるユーザー情報
//! - [`workout`], [`meal`], [`tracking`] - 記録系エンティティ
//! - [`nutrition`] - BMR とエネルギー目標の計算
//! - [`generation`] - LLM 生成結果の型付きスキーマ
//! - [`integration`], [`activity`] - Strava 連携の資格情報とアクティビティ変換
//! - [`schedule`] - 日次・週次スケジュール生成の記録と日付ごとの集約
//!
//! ## 使用例
//!
//! ```rust
//! use fitplan_domain::{DomainError, user::UserId};
//!
//! let user_id = UserId::new();
//!
//! let error = DomainError::NotFound {
//!     entity_type: "Workout",
//!     id:          user_id.to_string(),
//! };
//! assert!(error.to_string().contains("Workout"));
//! ```

#[macro_use]
mod macros;

pub mod activity;
pub mod clock;
pub mod dietary;
pub mod error;
pub mod generation;
pub mod goal;
pub mod integration;
pub mod meal;
pub mod nutrition;
pub mod profile;
pub mod schedule;
pub mod tracking;
pub mod user;
pub mod value_objects;
pub mod workout;

pub use error::DomainError;
