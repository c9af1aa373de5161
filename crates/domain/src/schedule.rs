//! # スケジュール
//!
//! 日次・週次スケジュール生成の記録と、日付ごとの集約。
//!
//! ## 生成記録（`schedule_generations`）
//!
//! `(user_id, schedule_date)` を主キーとする記録で「その日が生成済みか」を判定する。
//! 行の有無（手動で追加したワークアウトなど）には左右されない。
//!
//! ```text
//! (なし) ──claim──▶ pending ──complete──▶ completed
//!                     │
//!                     ├──失敗で release──▶ (なし)
//!                     └──10 分経過──▶ 再 claim 可能
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, meal::Meal, user::UserId, workout::Workout};

/// pending の claim が放棄されたとみなすまでの時間
pub const CLAIM_TIMEOUT_MINUTES: i64 = 10;

pub fn claim_timeout() -> Duration {
   Duration::minutes(CLAIM_TIMEOUT_MINUTES)
}

/// スケジュール上のワークアウト時刻（07:00）
pub fn workout_slot() -> NaiveTime {
   NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// 週次スケジュールの既定の運動日数
pub const DEFAULT_DAYS_PER_WEEK: u8 = 4;

/// 生成記録の状態
#[derive(
   Debug,
   Clone,
   Copy,
   PartialEq,
   Eq,
   Serialize,
   Deserialize,
   IntoStaticStr,
   strum::Display,
   strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GenerationStatus {
   /// 生成中
   Pending,
   /// 生成完了
   Completed,
}

/// スケジュール生成記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleGeneration {
   user_id:       UserId,
   schedule_date: NaiveDate,
   status:        GenerationStatus,
   claimed_at:    DateTime<Utc>,
   completed_at:  Option<DateTime<Utc>>,
}

impl ScheduleGeneration {
   pub fn claim(user_id: UserId, schedule_date: NaiveDate, now: DateTime<Utc>) -> Self {
      Self {
         user_id,
         schedule_date,
         status: GenerationStatus::Pending,
         claimed_at: now,
         completed_at: None,
      }
   }

   pub fn from_db(
      user_id: UserId,
      schedule_date: NaiveDate,
      status: GenerationStatus,
      claimed_at: DateTime<Utc>,
      completed_at: Option<DateTime<Utc>>,
   ) -> Self {
      Self {
         user_id,
         schedule_date,
         status,
         claimed_at,
         completed_at,
      }
   }

   /// 別のリクエストが再 claim してよいか
   pub fn is_reclaimable(&self, now: DateTime<Utc>) -> bool {
      self.status == GenerationStatus::Pending && now - self.claimed_at >= claim_timeout()
   }

   pub fn completed(self, now: DateTime<Utc>) -> Self {
      Self {
         status: GenerationStatus::Completed,
         completed_at: Some(now),
         ..self
      }
   }

   // --- ゲッター ---

   pub fn user_id(&self) -> &UserId {
      &self.user_id
   }

   pub fn schedule_date(&self) -> NaiveDate {
      self.schedule_date
   }

   pub fn status(&self) -> GenerationStatus {
      self.status
   }

   pub fn claimed_at(&self) -> DateTime<Utc> {
      self.claimed_at
   }

   pub fn completed_at(&self) -> Option<DateTime<Utc>> {
      self.completed_at
   }
}

/// スケジュールの項目種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ScheduleItemType {
   Workout,
   Meal,
}

impl std::str::FromStr for ScheduleItemType {
   type Err = DomainError;

   fn from_str(s: &str) -> Result<Self, Self::Err> {
      match s {
         "workout" => Ok(Self::Workout),
         "meal" => Ok(Self::Meal),
         _ => Err(DomainError::Validation(format!(
            "項目種別は workout または meal である必要があります: {s}"
         ))),
      }
   }
}

/// 1 日分のスケジュール
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledDay {
   pub date:     NaiveDate,
   pub workouts: Vec<Workout>,
   pub meals:    Vec<Meal>,
}

/// ワークアウトと食事を予定日ごとにまとめる（日付の昇順）
///
/// 各日の中では入力順を保つ。
pub fn group_by_date(workouts: Vec<Workout>, meals: Vec<Meal>) -> Vec<ScheduledDay> {
   let mut days: BTreeMap<NaiveDate, ScheduledDay> = BTreeMap::new();

   for workout in workouts {
      days.entry(workout.scheduled_date)
         .or_insert_with(|| empty_day(workout.scheduled_date))
         .workouts
         .push(workout);
   }
   for meal in meals {
      days.entry(meal.scheduled_date)
         .or_insert_with(|| empty_day(meal.scheduled_date))
         .meals
         .push(meal);
   }

   days.into_values().collect()
}

fn empty_day(date: NaiveDate) -> ScheduledDay {
   ScheduledDay {
      date,
      workouts: Vec::new(),
      meals: Vec::new(),
   }
}

/// 英語の曜日名（`Monday` など）
pub fn day_name(date: NaiveDate) -> String {
   date.format("%A").to_string()
}

#[cfg(test)]
mod tests {
   use chrono::TimeZone;
   use pretty_assertions::assert_eq;
   use rstest::rstest;

   use super::*;
   use crate::{
      meal::{MealId, MealType, NewMeal},
      value_objects::Title,
      workout::{NewWorkout, WorkoutId},
   };

   fn date(d: u32) -> NaiveDate {
      NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
   }

   fn workout(d: u32) -> Workout {
      NewWorkout::planned(Title::new("Run").unwrap(), "cardio", date(d)).into_workout(
         WorkoutId::new(),
         UserId::new(),
         Utc::now(),
      )
   }

   fn meal(d: u32) -> Meal {
      NewMeal::planned(Title::new("Salad").unwrap(), MealType::Lunch, date(d)).into_meal(
         MealId::new(),
         UserId::new(),
         Utc::now(),
      )
   }

   #[test]
   fn test_日付ごとに昇順でまとめる() {
      let days = group_by_date(vec![workout(3), workout(1)], vec![meal(2), meal(1), meal(1)]);

      let summary: Vec<(NaiveDate, usize, usize)> = days
         .iter()
         .map(|d| (d.date, d.workouts.len(), d.meals.len()))
         .collect();
      assert_eq!(
         summary,
         vec![(date(1), 1, 2), (date(2), 0, 1), (date(3), 1, 0)]
      );
   }

   #[test]
   fn test_空の入力は空の結果() {
      assert!(group_by_date(vec![], vec![]).is_empty());
   }

   #[rstest]
   #[case(9, false)]
   #[case(10, true)]
   #[case(30, true)]
   fn test_pendingは10分経過で再claim可能(#[case] minutes: i64, #[case] expected: bool) {
      let claimed_at = Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap();
      let generation = ScheduleGeneration::claim(UserId::new(), date(1), claimed_at);

      assert_eq!(
         generation.is_reclaimable(claimed_at + Duration::minutes(minutes)),
         expected
      );
   }

   #[test]
   fn test_completedは再claimできない() {
      let claimed_at = Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap();
      let generation =
         ScheduleGeneration::claim(UserId::new(), date(1), claimed_at).completed(claimed_at);

      assert_eq!(generation.status(), GenerationStatus::Completed);
      assert!(!generation.is_reclaimable(claimed_at + Duration::days(1)));
   }

   #[test]
   fn test_項目種別のパース() {
      assert_eq!("workout".parse::<ScheduleItemType>().unwrap(), ScheduleItemType::Workout);
      assert_eq!("meal".parse::<ScheduleItemType>().unwrap(), ScheduleItemType::Meal);
      assert!(matches!(
         "sleep".parse::<ScheduleItemType>(),
         Err(DomainError::Validation(_))
      ));
   }

   #[test]
   fn test_曜日名() {
      assert_eq!(day_name(date(1)), "Saturday");
      assert_eq!(workout_slot().to_string(), "07:00:00");
   }
}
