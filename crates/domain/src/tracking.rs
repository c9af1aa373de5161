//! # 健康記録
//!
//! 睡眠・体重・水分摂取のサンプル。追記中心で、日付範囲で新しい順に参照される。
//!
//! 入力値は `New*` 型の生成時に範囲チェックされる。

use chrono::{DateTime, NaiveDate, Utc};

use crate::{DomainError, user::UserId};

define_uuid_id! {
   /// 健康記録サンプルの一意識別子（3 種共通）
   pub struct SampleId("記録 ID");
}

/// 睡眠記録
#[derive(Debug, Clone, PartialEq)]
pub struct SleepEntry {
   pub id:             SampleId,
   pub user_id:        UserId,
   pub date:           NaiveDate,
   pub duration_hours: f64,
   pub quality_rating: i16,
   pub notes:          Option<String>,
   pub created_at:     DateTime<Utc>,
}

/// 体重記録
#[derive(Debug, Clone, PartialEq)]
pub struct WeightEntry {
   pub id:         SampleId,
   pub user_id:    UserId,
   pub date:       NaiveDate,
   pub weight_kg:  f64,
   pub notes:      Option<String>,
   pub created_at: DateTime<Utc>,
}

/// 水分摂取記録
#[derive(Debug, Clone, PartialEq)]
pub struct WaterIntake {
   pub id:         SampleId,
   pub user_id:    UserId,
   pub date:       NaiveDate,
   pub amount_ml:  i32,
   pub created_at: DateTime<Utc>,
}

/// 睡眠記録の作成入力
///
/// # 不変条件
///
/// - `0 < duration_hours <= 24`
/// - `1 <= quality_rating <= 5`
#[derive(Debug, Clone, PartialEq)]
pub struct NewSleepEntry {
   date:           NaiveDate,
   duration_hours: f64,
   quality_rating: i16,
   notes:          Option<String>,
}

impl NewSleepEntry {
   pub fn new(
      date: NaiveDate,
      duration_hours: f64,
      quality_rating: i16,
      notes: Option<String>,
   ) -> Result<Self, DomainError> {
      if !(duration_hours > 0.0 && duration_hours <= 24.0) {
         return Err(DomainError::Validation(
            "睡眠時間は 0〜24 時間で入力してください".to_string(),
         ));
      }
      if !(1..=5).contains(&quality_rating) {
         return Err(DomainError::Validation(
            "睡眠の質は 1〜5 で入力してください".to_string(),
         ));
      }
      Ok(Self {
         date,
         duration_hours,
         quality_rating,
         notes,
      })
   }

   pub fn into_entry(self, id: SampleId, user_id: UserId, now: DateTime<Utc>) -> SleepEntry {
      SleepEntry {
         id,
         user_id,
         date: self.date,
         duration_hours: self.duration_hours,
         quality_rating: self.quality_rating,
         notes: self.notes,
         created_at: now,
      }
   }
}

/// 体重記録の作成入力
#[derive(Debug, Clone, PartialEq)]
pub struct NewWeightEntry {
   date:      NaiveDate,
   weight_kg: f64,
   notes:     Option<String>,
}

impl NewWeightEntry {
   pub fn new(date: NaiveDate, weight_kg: f64, notes: Option<String>) -> Result<Self, DomainError> {
      if !(weight_kg > 0.0 && weight_kg <= 500.0) {
         return Err(DomainError::Validation(
            "体重は 0〜500 kg で入力してください".to_string(),
         ));
      }
      Ok(Self {
         date,
         weight_kg,
         notes,
      })
   }

   pub fn into_entry(self, id: SampleId, user_id: UserId, now: DateTime<Utc>) -> WeightEntry {
      WeightEntry {
         id,
         user_id,
         date: self.date,
         weight_kg: self.weight_kg,
         notes: self.notes,
         created_at: now,
      }
   }
}

/// 1 回の記録で受け付ける水分量の上限（ml）
const MAX_WATER_AMOUNT_ML: i32 = 10_000;

/// 水分摂取記録の作成入力
#[derive(Debug, Clone, PartialEq)]
pub struct NewWaterIntake {
   date:      NaiveDate,
   amount_ml: i32,
}

impl NewWaterIntake {
   pub fn new(date: NaiveDate, amount_ml: i32) -> Result<Self, DomainError> {
      if !(1..=MAX_WATER_AMOUNT_ML).contains(&amount_ml) {
         return Err(DomainError::Validation(format!(
            "水分量は 1〜{MAX_WATER_AMOUNT_ML} ml で入力してください"
         )));
      }
      Ok(Self { date, amount_ml })
   }

   pub fn into_entry(self, id: SampleId, user_id: UserId, now: DateTime<Utc>) -> WaterIntake {
      WaterIntake {
         id,
         user_id,
         date: self.date,
         amount_ml: self.amount_ml,
         created_at: now,
      }
   }
}
