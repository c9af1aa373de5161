//! # FitPlan Infrastructure Layer
//!
//! 永続化の具体的な実装を提供する。
//!
//! ## 主要モジュール
//!
//! - [`db`]: 接続プール、ユーザースコープ付きコネクション、トランザクション
//! - [`repository`]: ドメインエンティティのリポジトリ実装
//! - [`error`]: インフラ層のエラー定義
//! - `mock`: ユースケーステスト用のインメモリ実装（`test-utils` feature）
//!
//! ## RLS
//!
//! ユーザーデータを持つ全テーブルに Row Level Security を設定している。
//! ポリシーは `app.user_id` セッション変数を参照するため、リクエスト処理では
//! 必ず [`db::UserConnection`] か [`db::TxContext`] を経由してクエリを発行する。

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
