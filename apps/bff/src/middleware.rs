//! # ミドルウェア
//!
//! BFF 用のミドルウェアを提供する。
//!
//! - [`require_auth`]: Bearer トークンを検証し、呼び出し元を extensions に格納する
//! - [`request_id`]: リクエスト ID を task-local に保存し、外部呼び出しへ伝播する

mod auth;
pub mod request_id;

pub use auth::require_auth;
