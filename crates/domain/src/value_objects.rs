//! # 共通値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Title`] | `String` | ワークアウト・食事のタイトル |
//! | [`DateRange`] | `Option<NaiveDate>` × 2 | 一覧取得の日付範囲（両端含む） |
//! | [`ItemUpdate`] | 部分更新フィールド | ワークアウト・食事の部分更新 |

use chrono::{NaiveDate, NaiveTime};

use crate::DomainError;

// =========================================================================
// Title（タイトル）
// =========================================================================

define_validated_string! {
   /// ワークアウト・食事のタイトル（値オブジェクト）
   ///
   /// # バリデーション
   ///
   /// - 空文字列ではない
   /// - 最大 200 文字
   pub struct Title {
      label: "タイトル",
      max_length: 200,
   }
}

// =========================================================================
// DateRange（日付範囲）
// =========================================================================

/// 日付範囲（値オブジェクト）
///
/// 両端を含む。どちらの端も省略可能で、省略した側は無制限になる。
///
/// # 不変条件
///
/// - 両端が指定されている場合は `start <= end`
///
/// ```rust
/// use chrono::NaiveDate;
/// use fitplan_domain::value_objects::DateRange;
///
/// let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
/// let range = DateRange::new(Some(start), Some(end)).unwrap();
///
/// assert!(range.contains(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()));
/// assert!(DateRange::new(Some(end), Some(start)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
   start: Option<NaiveDate>,
   end:   Option<NaiveDate>,
}

impl DateRange {
   pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, DomainError> {
      if let (Some(s), Some(e)) = (start, end)
         && s > e
      {
         return Err(DomainError::Validation(format!(
            "開始日 {s} は終了日 {e} 以前である必要があります"
         )));
      }
      Ok(Self { start, end })
   }

   /// 両端を指定した範囲
   pub fn between(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
      Self::new(Some(start), Some(end))
   }

   /// 無制限の範囲
   pub fn unbounded() -> Self {
      Self::default()
   }

   pub fn start(&self) -> Option<NaiveDate> {
      self.start
   }

   pub fn end(&self) -> Option<NaiveDate> {
      self.end
   }

   pub fn contains(&self, date: NaiveDate) -> bool {
      self.start.is_none_or(|s| s <= date) && self.end.is_none_or(|e| date <= e)
   }
}

// =========================================================================
// ItemUpdate（部分更新）
// =========================================================================

/// ワークアウト・食事の部分更新
///
/// `None` のフィールドは変更しない。
/// `completed` が `false` から `true` に変わると `completed_at` に現在時刻が入り、
/// `false` に戻すと `completed_at` はクリアされる。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
   pub title:          Option<Title>,
   pub description:    Option<String>,
   pub completed:      Option<bool>,
   pub notes:          Option<String>,
   pub scheduled_date: Option<NaiveDate>,
   pub scheduled_time: Option<NaiveTime>,
}

impl ItemUpdate {
   pub fn is_empty(&self) -> bool {
      self == &Self::default()
   }
}
