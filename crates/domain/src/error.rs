//! # ドメイン層エラー定義
//!
//! 入力値のルール違反と、所有者スコープで見つからないエンティティを表現する。
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない（他ユーザーの行を含む） |
//!
//! ```rust
//! use fitplan_domain::DomainError;
//!
//! fn validate_rating(rating: i16) -> Result<(), DomainError> {
//!     if !(1..=5).contains(&rating) {
//!         return Err(DomainError::Validation(
//!             "睡眠の質は 1〜5 で入力してください".to_string(),
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_rating(6).is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
   /// バリデーションエラー
   ///
   /// 必須項目の欠落、文字数超過、範囲外の数値など。
   #[error("バリデーションエラー: {0}")]
   Validation(String),

   /// エンティティが見つからない
   ///
   /// 他ユーザーの行は RLS とクエリ条件で除外されるため、
   /// 存在しない場合と区別しない。
   #[error("{entity_type} が見つかりません: {id}")]
   NotFound {
      /// エンティティの種類（"Workout", "Meal" など）
      entity_type: &'static str,
      /// 検索に使用した識別子
      id:          String,
   },
}
