//! # Strava アクティビティ変換
//!
//! Strava のアクティビティとワークアウトの相互変換表。
//!
//! | Strava | ワークアウト種別 |
//! |--------|------------------|
//! | Run, Ride, Swim, Walk, Hike | cardio |
//! | WeightTraining, Workout, Crossfit | strength |
//! | Yoga | flexibility |
//! | その他 | cardio |
//!
//! 逆方向（ワークアウト → Strava）は cardio→Run、strength→WeightTraining、
//! flexibility→Yoga、sports→Workout、その他→Workout。

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
   DomainError,
   integration::Provider,
   value_objects::Title,
   workout::{ExternalSource, NewWorkout, Workout, workout_type},
};

/// Strava のアクティビティ種別 → ワークアウト種別
pub fn workout_type_for_activity(activity_type: &str) -> &'static str {
   match activity_type {
      "Run" | "Ride" | "Swim" | "Walk" | "Hike" => workout_type::CARDIO,
      "WeightTraining" | "Workout" | "Crossfit" => workout_type::STRENGTH,
      "Yoga" => workout_type::FLEXIBILITY,
      _ => workout_type::CARDIO,
   }
}

/// ワークアウト種別 → Strava のアクティビティ種別
pub fn activity_type_for_workout(workout_type: &str) -> &'static str {
   match workout_type {
      workout_type::CARDIO => "Run",
      workout_type::STRENGTH => "WeightTraining",
      workout_type::FLEXIBILITY => "Yoga",
      _ => "Workout",
   }
}

/// 運動強度
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Intensity {
   Low,
   Medium,
   High,
}

impl Intensity {
   /// 平均心拍数から推定する（心拍データなしは low）
   pub fn from_heart_rate(average_heartrate: Option<f64>) -> Self {
      match average_heartrate.unwrap_or(0.0) {
         hr if hr > 150.0 => Self::High,
         hr if hr > 120.0 => Self::Medium,
         _ => Self::Low,
      }
   }
}

/// Strava API が返すアクティビティ
///
/// 変換に使うフィールドだけを型付きで持ち、残りは `extra` にそのまま保持する
/// （一覧 API ではクライアントに全フィールドを返す）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StravaActivity {
   pub id:                   i64,
   pub name:                 String,
   #[serde(rename = "type")]
   pub activity_type:        String,
   pub moving_time:          i64,
   #[serde(default)]
   pub distance:             Option<f64>,
   #[serde(default)]
   pub total_elevation_gain: Option<f64>,
   #[serde(default)]
   pub average_heartrate:    Option<f64>,
   #[serde(default)]
   pub calories:             Option<f64>,
   pub start_date:           DateTime<Utc>,
   /// 現地時刻（末尾に `Z` が付くがタイムゾーンは現地）
   pub start_date_local:     String,
   #[serde(flatten)]
   pub extra:                serde_json::Map<String, serde_json::Value>,
}

impl StravaActivity {
   fn local_start(&self) -> Result<NaiveDateTime, DomainError> {
      let raw = self.start_date_local.trim_end_matches('Z');
      NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map_err(|e| {
         DomainError::Validation(format!(
            "start_date_local を解釈できません ({}): {e}",
            self.start_date_local
         ))
      })
   }

   fn sync_notes(&self) -> String {
      let heart_rate = self
         .average_heartrate
         .map_or_else(|| "N/A".to_string(), |hr| hr.to_string());
      format!(
         "Strava ID: {}\nDistance: {:.2} km\nElevation: {} m\nAvg HR: {heart_rate}",
         self.id,
         self.distance.unwrap_or(0.0) / 1000.0,
         self.total_elevation_gain.unwrap_or(0.0),
      )
   }

   /// 実施済みワークアウトとして取り込む入力に変換する
   ///
   /// `(provider, external_id)` を持つため、同じアクティビティの再取り込みは
   /// ストア側の一意制約で読み飛ばされる。
   pub fn to_new_workout(&self) -> Result<NewWorkout, DomainError> {
      let start = self.local_start()?;
      let title = if self.name.trim().is_empty() {
         Title::new(&self.activity_type)?
      } else {
         Title::new(&self.name)?
      };

      let mut workout = NewWorkout::planned(
         title,
         workout_type_for_activity(&self.activity_type),
         start.date(),
      );
      workout.description = Some(format!("Synced from Strava - {}", self.activity_type));
      workout.duration_minutes = i32::try_from(self.moving_time / 60).ok();
      workout.calories_burned = Some(self.calories.unwrap_or(0.0) as i32);
      workout.intensity = Some(Intensity::from_heart_rate(self.average_heartrate).to_string());
      workout.scheduled_time = Some(start.time());
      workout.notes = Some(self.sync_notes());
      workout.completed = true;
      workout.completed_at = Some(self.start_date);
      workout.source = Some(ExternalSource {
         provider:    Provider::Strava.to_string(),
         external_id: self.id.to_string(),
      });
      Ok(workout)
   }
}

/// Strava に登録するアクティビティ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStravaActivity {
   pub name:             String,
   #[serde(rename = "type")]
   pub activity_type:    String,
   pub start_date_local: String,
   /// 秒
   pub elapsed_time:     i64,
   pub description:      String,
   /// 1 = 屋内
   pub trainer:          u8,
   pub commute:          u8,
}

impl NewStravaActivity {
   pub fn from_workout(workout: &Workout) -> Self {
      let time = workout
         .scheduled_time
         .or_else(|| NaiveTime::from_hms_opt(12, 0, 0))
         .unwrap_or(NaiveTime::MIN);

      Self {
         name:             workout.title.clone(),
         activity_type:    activity_type_for_workout(&workout.workout_type).to_string(),
         start_date_local: format!(
            "{}T{}Z",
            workout.scheduled_date.format("%Y-%m-%d"),
            time.format("%H:%M:%S")
         ),
         elapsed_time:     i64::from(workout.duration_minutes.unwrap_or(0)) * 60,
         description:      workout.description.clone().unwrap_or_default(),
         trainer:          1,
         commute:          0,
      }
   }
}

#[cfg(test)]
mod tests {
   use chrono::{NaiveDate, TimeZone};
   use pretty_assertions::assert_eq;
   use rstest::rstest;
   use serde_json::json;

   use super::*;
   use crate::{
      user::UserId,
      workout::WorkoutId,
   };

   fn activity_json() -> serde_json::Value {
      json!({
         "id": 987654321,
         "name": "Morning Run",
         "type": "Run",
         "moving_time": 1830,
         "elapsed_time": 1900,
         "distance": 5234.0,
         "total_elevation_gain": 42.5,
         "average_heartrate": 152.3,
         "start_date": "2025-03-01T22:30:00Z",
         "start_date_local": "2025-03-02T07:30:00Z",
         "kudos_count": 3
      })
   }

   #[rstest]
   #[case("Run", "cardio")]
   #[case("Ride", "cardio")]
   #[case("Swim", "cardio")]
   #[case("Walk", "cardio")]
   #[case("Hike", "cardio")]
   #[case("WeightTraining", "strength")]
   #[case("Workout", "strength")]
   #[case("Crossfit", "strength")]
   #[case("Yoga", "flexibility")]
   #[case("Kitesurf", "cardio")]
   fn test_stravaの種別からワークアウト種別への変換(#[case] strava: &str, #[case] expected: &str) {
      assert_eq!(workout_type_for_activity(strava), expected);
   }

   #[rstest]
   #[case("cardio", "Run")]
   #[case("strength", "WeightTraining")]
   #[case("flexibility", "Yoga")]
   #[case("sports", "Workout")]
   #[case("dance", "Workout")]
   fn test_ワークアウト種別からstravaの種別への変換(#[case] workout: &str, #[case] expected: &str) {
      assert_eq!(activity_type_for_workout(workout), expected);
   }

   #[rstest]
   #[case(Some(151.0), Intensity::High)]
   #[case(Some(150.0), Intensity::Medium)]
   #[case(Some(121.0), Intensity::Medium)]
   #[case(Some(120.0), Intensity::Low)]
   #[case(None, Intensity::Low)]
   fn test_心拍数から強度を推定する(#[case] hr: Option<f64>, #[case] expected: Intensity) {
      assert_eq!(Intensity::from_heart_rate(hr), expected);
   }

   #[test]
   fn test_アクティビティを実施済みワークアウトに変換する() {
      let activity: StravaActivity = serde_json::from_value(activity_json()).unwrap();

      let workout = activity.to_new_workout().unwrap();

      assert_eq!(workout.title.as_str(), "Morning Run");
      assert_eq!(workout.workout_type, "cardio");
      assert_eq!(workout.description.as_deref(), Some("Synced from Strava - Run"));
      assert_eq!(workout.duration_minutes, Some(30));
      assert_eq!(workout.calories_burned, Some(0));
      assert_eq!(workout.intensity.as_deref(), Some("high"));
      assert_eq!(workout.scheduled_date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
      assert_eq!(workout.scheduled_time, NaiveTime::from_hms_opt(7, 30, 0));
      assert!(workout.completed);
      assert_eq!(
         workout.completed_at,
         Some(Utc.with_ymd_and_hms(2025, 3, 1, 22, 30, 0).unwrap())
      );
      assert_eq!(
         workout.notes.as_deref(),
         Some("Strava ID: 987654321\nDistance: 5.23 km\nElevation: 42.5 m\nAvg HR: 152.3")
      );
      assert_eq!(
         workout.source,
         Some(ExternalSource {
            provider:    "strava".to_string(),
            external_id: "987654321".to_string(),
         })
      );
   }

   #[test]
   fn test_未知のフィールドはextraに保持される() {
      let activity: StravaActivity = serde_json::from_value(activity_json()).unwrap();
      let round = serde_json::to_value(&activity).unwrap();

      assert_eq!(round["kudos_count"], 3);
      assert_eq!(round["type"], "Run");
   }

   #[test]
   fn test_不正な現地時刻はバリデーションエラー() {
      let mut value = activity_json();
      value["start_date_local"] = json!("yesterday");
      let activity: StravaActivity = serde_json::from_value(value).unwrap();

      assert!(matches!(activity.to_new_workout(), Err(DomainError::Validation(_))));
   }

   #[test]
   fn test_ワークアウトからstravaアクティビティを作る() {
      let now = Utc::now();
      let mut workout = NewWorkout::planned(
         Title::new("Leg Day").unwrap(),
         "strength",
         NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
      );
      workout.duration_minutes = Some(45);
      let workout = workout.into_workout(WorkoutId::new(), UserId::new(), now);

      let activity = NewStravaActivity::from_workout(&workout);

      assert_eq!(
         serde_json::to_value(&activity).unwrap(),
         json!({
            "name": "Leg Day",
            "type": "WeightTraining",
            "start_date_local": "2025-03-01T12:00:00Z",
            "elapsed_time": 2700,
            "description": "",
            "trainer": 1,
            "commute": 0
         })
      );
   }
}
