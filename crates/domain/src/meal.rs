//! # 食事
//!
//! 予定・実施済みの食事。手動作成と AI 生成で作られる。
//! 食事区分ごとにエネルギー配分とスケジュール上の既定時刻を持つ。

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
   user::UserId,
   value_objects::{ItemUpdate, Title},
};

define_uuid_id! {
   /// 食事の一意識別子
   pub struct MealId("食事 ID");
}

/// 食事区分
#[derive(
   Debug,
   Clone,
   Copy,
   PartialEq,
   Eq,
   PartialOrd,
   Ord,
   Hash,
   Serialize,
   Deserialize,
   IntoStaticStr,
   strum::Display,
   strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum MealType {
   Breakfast,
   Lunch,
   Dinner,
   Snack,
}

impl MealType {
   /// 日次プランで生成する順序
   pub const ALL: [Self; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snack];

   /// 1 日のエネルギー目標に対する配分（4 区分の合計は 1.0）
   pub fn calorie_share(self) -> f64 {
      match self {
         Self::Breakfast => 0.25,
         Self::Lunch => 0.35,
         Self::Dinner => 0.30,
         Self::Snack => 0.10,
      }
   }

   /// スケジュール生成時の既定時刻
   pub fn default_time(self) -> NaiveTime {
      let (h, m) = match self {
         Self::Breakfast => (8, 0),
         Self::Lunch => (12, 30),
         Self::Snack => (15, 0),
         Self::Dinner => (18, 30),
      };
      NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
   }
}

/// 食事エンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct Meal {
   pub id:             MealId,
   pub user_id:        UserId,
   pub title:          String,
   pub description:    Option<String>,
   pub meal_type:      MealType,
   pub calories:       Option<i32>,
   pub protein_g:      Option<f64>,
   pub carbs_g:        Option<f64>,
   pub fat_g:          Option<f64>,
   /// 材料（生成結果の `ingredients` をそのまま JSON で保持）
   pub ingredients:    Option<serde_json::Value>,
   pub recipe_url:     Option<String>,
   pub scheduled_date: NaiveDate,
   pub scheduled_time: Option<NaiveTime>,
   pub notes:          Option<String>,
   pub completed:      bool,
   pub completed_at:   Option<DateTime<Utc>>,
   pub created_at:     DateTime<Utc>,
   pub updated_at:     DateTime<Utc>,
}

impl Meal {
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

/// 食事の作成入力
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeal {
   pub title:          Title,
   pub description:    Option<String>,
   pub meal_type:      MealType,
   pub calories:       Option<i32>,
   pub protein_g:      Option<f64>,
   pub carbs_g:        Option<f64>,
   pub fat_g:          Option<f64>,
   pub ingredients:    Option<serde_json::Value>,
   pub recipe_url:     Option<String>,
   pub scheduled_date: NaiveDate,
   pub scheduled_time: Option<NaiveTime>,
   pub notes:          Option<String>,
}

impl NewMeal {
   pub fn planned(title: Title, meal_type: MealType, scheduled_date: NaiveDate) -> Self {
      Self {
         title,
         description: None,
         meal_type,
         calories: None,
         protein_g: None,
         carbs_g: None,
         fat_g: None,
         ingredients: None,
         recipe_url: None,
         scheduled_date,
         scheduled_time: None,
         notes: None,
      }
   }

   /// 新しい食事エンティティを作成する
   pub fn into_meal(self, id: MealId, user_id: UserId, now: DateTime<Utc>) -> Meal {
      Meal {
         id,
         user_id,
         title: self.title.into_string(),
         description: self.description,
         meal_type: self.meal_type,
         calories: self.calories,
         protein_g: self.protein_g,
         carbs_g: self.carbs_g,
         fat_g: self.fat_g,
         ingredients: self.ingredients,
         recipe_url: self.recipe_url,
         scheduled_date: self.scheduled_date,
         scheduled_time: self.scheduled_time,
         notes: self.notes,
         completed: false,
         completed_at: None,
         created_at: now,
         updated_at: now,
      }
   }
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;
   use rstest::rstest;

   use super::*;

   #[test]
   fn test_4区分の配分の合計は1() {
      let total: f64 = MealType::ALL.iter().map(|m| m.calorie_share()).sum();
      assert!((total - 1.0).abs() < f64::EPSILON);
   }

   #[rstest]
   #[case(MealType::Breakfast, "08:00:00")]
   #[case(MealType::Lunch, "12:30:00")]
   #[case(MealType::Snack, "15:00:00")]
   #[case(MealType::Dinner, "18:30:00")]
   fn test_区分ごとの既定時刻(#[case] meal_type: MealType, #[case] expected: &str) {
      assert_eq!(meal_type.default_time().to_string(), expected);
   }

   #[test]
   fn test_文字列との相互変換() {
      assert_eq!("lunch".parse::<MealType>().unwrap(), MealType::Lunch);
      assert_eq!(MealType::Snack.to_string(), "snack");
      assert!("brunch".parse::<MealType>().is_err());
   }

   #[test]
   fn test_into_mealは未完了で作成する() {
      let now = Utc::now();
      let meal = NewMeal::planned(
         Title::new("オートミール").unwrap(),
         MealType::Breakfast,
         NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
      )
      .into_meal(MealId::new(), UserId::new(), now);

      assert!(!meal.completed);
      assert_eq!(meal.completed_at, None);
      assert_eq!(meal.title, "オートミール");
   }
}
