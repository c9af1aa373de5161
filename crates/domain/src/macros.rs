//! ドメイン型定義用の宣言型マクロ
//!
//! ID 型と、入力検証付きの文字列型のボイラープレートを生成する。

/// 入力文字列を trim し、空でなく最大文字数以内であることを確かめる
///
/// `define_validated_string!` が生成する `new()` から呼ばれる。
#[doc(hidden)]
pub fn validate_text(
   label: &str,
   max_chars: usize,
   value: String,
) -> Result<String, crate::DomainError> {
   let trimmed = value.trim();
   if trimmed.is_empty() {
      return Err(crate::DomainError::Validation(format!("{label}は必須です")));
   }
   if trimmed.chars().count() > max_chars {
      return Err(crate::DomainError::Validation(format!(
         "{label}は {max_chars} 文字以内である必要があります"
      )));
   }
   Ok(trimmed.to_string())
}

/// UUID をラップした ID 型を定義する
///
/// 括弧内はパース失敗時のエラーメッセージに使うラベル。
///
/// - `new()` は UUID v7 を生成する（`Default` も同じ）
/// - `from_uuid()` / `as_uuid()` で DB や外部表現と相互変換する
/// - `FromStr` は不正な文字列を `DomainError::Validation` にする
///
/// ```rust
/// use fitplan_domain::workout::WorkoutId;
///
/// let id = WorkoutId::new();
/// let parsed: WorkoutId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// assert!("abc".parse::<WorkoutId>().is_err());
/// ```
macro_rules! define_uuid_id {
   (
      $(#[$meta:meta])*
      $vis:vis struct $Name:ident($label:literal);
   ) => {
      $(#[$meta])*
      #[derive(
         Debug, Clone, PartialEq, Eq, Hash,
         serde::Serialize, serde::Deserialize,
         derive_more::Display,
      )]
      #[display("{_0}")]
      $vis struct $Name(uuid::Uuid);

      impl $Name {
         pub fn new() -> Self {
            Self(uuid::Uuid::now_v7())
         }

         pub fn from_uuid(uuid: uuid::Uuid) -> Self {
            Self(uuid)
         }

         pub fn as_uuid(&self) -> &uuid::Uuid {
            &self.0
         }
      }

      impl Default for $Name {
         fn default() -> Self {
            Self::new()
         }
      }

      impl std::str::FromStr for $Name {
         type Err = $crate::DomainError;

         fn from_str(s: &str) -> Result<Self, Self::Err> {
            uuid::Uuid::parse_str(s)
               .map(Self)
               .map_err(|_| $crate::DomainError::Validation(format!("不正な{}: {s}", $label)))
         }
      }
   };
}

/// 入力検証付きの文字列型を定義する
///
/// `new()` は前後の空白を除き、空文字列と `max_length` 文字超を拒否する。
/// `as_str()` と `into_string()` で中身を取り出す。
///
/// `pii: true` を付けると `Debug` を `[REDACTED]` にし、`Display` を実装しない。
/// 付けなければ `Debug` と `Display` はそのまま値を出す。
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use fitplan_domain::profile::DisplayName;
///
/// let name = DisplayName::new("  山田太郎 ")?;
/// assert_eq!(name.as_str(), "山田太郎");
/// assert!(format!("{:?}", name).contains("[REDACTED]"));
/// # Ok(())
/// # }
/// ```
macro_rules! define_validated_string {
   (
      $(#[$meta:meta])*
      $vis:vis struct $Name:ident {
         label: $label:expr,
         max_length: $max_length:expr,
         pii: true $(,)?
      }
   ) => {
      $(#[$meta])*
      #[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
      $vis struct $Name(String);

      impl std::fmt::Debug for $Name {
         fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_tuple(stringify!($Name)).field(&"[REDACTED]").finish()
         }
      }

      define_validated_string!(@accessors $Name, $label, $max_length);
   };
   (
      $(#[$meta:meta])*
      $vis:vis struct $Name:ident {
         label: $label:expr,
         max_length: $max_length:expr $(,)?
      }
   ) => {
      $(#[$meta])*
      #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
      $vis struct $Name(String);

      impl std::fmt::Display for $Name {
         fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
         }
      }

      define_validated_string!(@accessors $Name, $label, $max_length);
   };
   (@accessors $Name:ident, $label:expr, $max_length:expr) => {
      impl $Name {
         pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
            $crate::macros::validate_text($label, $max_length, value.into()).map(Self)
         }

         pub fn as_str(&self) -> &str {
            &self.0
         }

         pub fn into_string(self) -> String {
            self.0
         }
      }
   };
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_validate_text_前後の空白を除いて返す() {
      assert_eq!(validate_text("名前", 5, "  abc ".to_string()).unwrap(), "abc");
   }

   #[test]
   fn test_validate_text_空白のみは必須エラー() {
      let err = validate_text("名前", 5, "   ".to_string()).unwrap_err();

      assert_eq!(err.to_string(), "バリデーションエラー: 名前は必須です");
   }

   #[test]
   fn test_validate_text_文字数は文字単位で数える() {
      assert!(validate_text("名前", 3, "あいう".to_string()).is_ok());
      assert!(validate_text("名前", 3, "あいうえ".to_string()).is_err());
   }
}
