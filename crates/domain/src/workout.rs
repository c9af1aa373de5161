//! # ワークアウト
//!
//! 予定・実施済みのワークアウト。手動作成、AI 生成、Strava 同期の 3 経路で作られる。
//!
//! Strava 由来の行は [`ExternalSource`]（プロバイダ + 外部 ID）を持ち、
//! `UNIQUE (user_id, source_provider, external_id)` で重複登録が防がれる。

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::{
   user::UserId,
   value_objects::{ItemUpdate, Title},
};

define_uuid_id! {
   /// ワークアウトの一意識別子
   pub struct WorkoutId("ワークアウト ID");
}

/// ワークアウト種別の既定値
pub mod workout_type {
   pub const CARDIO: &str = "cardio";
   pub const STRENGTH: &str = "strength";
   pub const FLEXIBILITY: &str = "flexibility";
   pub const SPORTS: &str = "sports";
   /// 週間プランの休養日（保存されない）
   pub const REST: &str = "rest";
}

/// 外部サービス由来の行を識別するキー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSource {
   pub provider:    String,
   pub external_id: String,
}

/// ワークアウトエンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
   pub id:               WorkoutId,
   pub user_id:          UserId,
   pub title:            String,
   pub description:      Option<String>,
   pub workout_type:     String,
   pub duration_minutes: Option<i32>,
   pub calories_burned:  Option<i32>,
   pub intensity:        Option<String>,
   pub scheduled_date:   NaiveDate,
   pub scheduled_time:   Option<NaiveTime>,
   pub notes:            Option<String>,
   pub completed:        bool,
   pub completed_at:     Option<DateTime<Utc>>,
   pub source:           Option<ExternalSource>,
   pub created_at:       DateTime<Utc>,
   pub updated_at:       DateTime<Utc>,
}

impl Workout {
   /// 部分更新を適用した新インスタンスを返す
   pub fn updated(self, update: ItemUpdate, now: DateTime<Utc>) -> Self {
      let completed_at = match update.completed {
         Some(true) if !self.completed => Some(now),
         Some(true) => self.completed_at,
         Some(false) => None,
         None => self.completed_at,
      };

      Self {
         title: update
            .title
            .map(Title::into_string)
            .unwrap_or(self.title),
         description: update.description.or(self.description),
         completed: update.completed.unwrap_or(self.completed),
         completed_at,
         notes: update.notes.or(self.notes),
         scheduled_date: update.scheduled_date.unwrap_or(self.scheduled_date),
         scheduled_time: update.scheduled_time.or(self.scheduled_time),
         updated_at: now,
         ..self
      }
   }
}

/// ワークアウトの作成入力
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkout {
   pub title:            Title,
   pub description:      Option<String>,
   pub workout_type:     String,
   pub duration_minutes: Option<i32>,
   pub calories_burned:  Option<i32>,
   pub intensity:        Option<String>,
   pub scheduled_date:   NaiveDate,
   pub scheduled_time:   Option<NaiveTime>,
   pub notes:            Option<String>,
   pub completed:        bool,
   pub completed_at:     Option<DateTime<Utc>>,
   pub source:           Option<ExternalSource>,
}

impl NewWorkout {
   /// 未実施の予定として作成する
   pub fn planned(title: Title, workout_type: impl Into<String>, scheduled_date: NaiveDate) -> Self {
      Self {
         title,
         description: None,
         workout_type: workout_type.into(),
         duration_minutes: None,
         calories_burned: None,
         intensity: None,
         scheduled_date,
         scheduled_time: None,
         notes: None,
         completed: false,
         completed_at: None,
         source: None,
      }
   }

   /// 新しいワークアウトエンティティを作成する
   pub fn into_workout(self, id: WorkoutId, user_id: UserId, now: DateTime<Utc>) -> Workout {
      Workout {
         id,
         user_id,
         title: self.title.into_string(),
         description: self.description,
         workout_type: self.workout_type,
         duration_minutes: self.duration_minutes,
         calories_burned: self.calories_burned,
         intensity: self.intensity,
         scheduled_date: self.scheduled_date,
         scheduled_time: self.scheduled_time,
         notes: self.notes,
         completed: self.completed,
         completed_at: self.completed_at,
         source: self.source,
         created_at: now,
         updated_at: now,
      }
   }
}
