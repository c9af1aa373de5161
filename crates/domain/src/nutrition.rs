//! # エネルギー目標と栄養集計
//!
//! Mifflin-St Jeor 式の BMR に活動係数と目標補正を掛けて 1 日のエネルギー目標を求め、
//! 食事区分の配分で 1 食あたりの目標に割り当てる。
//!
//! ```text
//! BMR = 10·体重(kg) + 6.25·身長(cm) − 5·年齢 + (女性 −161 / それ以外 +5)
//! 1 日の目標 = BMR × 活動係数 × 目標補正
//! 1 食の目標 = trunc(1 日の目標 × 区分配分)
//! ```
//!
//! プロフィール未設定の項目は体重 70 kg・身長 170 cm・年齢 30 歳、
//! 活動係数は 1.55 を使う。
//!
//! ```rust
//! use fitplan_domain::{
//!     meal::MealType,
//!     nutrition::{BodyMetrics, EnergyTarget},
//! };
//!
//! let target = EnergyTarget::compute(&BodyMetrics::from_profile(None), &[]);
//! assert_eq!(target.for_meal(MealType::Breakfast), 626);
//! ```

use serde::{Deserialize, Serialize};

use crate::{
   goal::{BUILD_MUSCLE, Goal, LOSE_WEIGHT},
   meal::{Meal, MealType},
   profile::{ActivityLevel, Gender, Profile},
};

pub const DEFAULT_WEIGHT_KG: f64 = 70.0;
pub const DEFAULT_HEIGHT_CM: f64 = 170.0;
pub const DEFAULT_AGE: f64 = 30.0;
/// 活動レベル未設定時の係数（moderate 相当）
pub const DEFAULT_ACTIVITY_MULTIPLIER: f64 = 1.55;

/// BMR 計算に使う身体情報（既定値適用済み）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMetrics {
   pub weight_kg:      f64,
   pub height_cm:      f64,
   pub age:            f64,
   pub gender:         Option<Gender>,
   pub activity_level: Option<ActivityLevel>,
}

impl BodyMetrics {
   /// プロフィールから身体情報を取り出す（未設定項目は既定値）
   pub fn from_profile(profile: Option<&Profile>) -> Self {
      Self {
         weight_kg:      profile
            .and_then(Profile::weight_kg)
            .unwrap_or(DEFAULT_WEIGHT_KG),
         height_cm:      profile
            .and_then(Profile::height_cm)
            .map_or(DEFAULT_HEIGHT_CM, f64::from),
         age:            profile
            .and_then(Profile::age)
            .map_or(DEFAULT_AGE, f64::from),
         gender:         profile.and_then(Profile::gender),
         activity_level: profile.and_then(Profile::activity_level),
      }
   }

   pub fn basal_metabolic_rate(&self) -> f64 {
      let base = 10.0 * self.weight_kg + 6.25 * self.height_cm - 5.0 * self.age;
      match self.gender {
         Some(Gender::Female) => base - 161.0,
         _ => base + 5.0,
      }
   }

   pub fn activity_multiplier(&self) -> f64 {
      self.activity_level
         .map_or(DEFAULT_ACTIVITY_MULTIPLIER, ActivityLevel::multiplier)
   }
}

/// 目標によるエネルギー補正
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalAdjustment {
   /// 減量: 15% 減
   Deficit,
   /// 増量: 10% 増
   Surplus,
   Maintain,
}

impl GoalAdjustment {
   /// 減量目標が優先される
   pub fn from_goals(goals: &[Goal]) -> Self {
      if goals.iter().any(|g| g.goal_type == LOSE_WEIGHT) {
         Self::Deficit
      } else if goals.iter().any(|g| g.goal_type == BUILD_MUSCLE) {
         Self::Surplus
      } else {
         Self::Maintain
      }
   }

   pub fn factor(self) -> f64 {
      match self {
         Self::Deficit => 0.85,
         Self::Surplus => 1.1,
         Self::Maintain => 1.0,
      }
   }
}

/// 1 日のエネルギー目標（kcal）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyTarget {
   daily_calories: f64,
}

impl EnergyTarget {
   pub fn compute(metrics: &BodyMetrics, goals: &[Goal]) -> Self {
      let daily_calories = metrics.basal_metabolic_rate()
         * metrics.activity_multiplier()
         * GoalAdjustment::from_goals(goals).factor();
      Self { daily_calories }
   }

   pub fn daily_calories(&self) -> f64 {
      self.daily_calories
   }

   /// 1 食あたりの目標（小数点以下切り捨て）
   pub fn for_meal(&self, meal_type: MealType) -> i32 {
      (self.daily_calories * meal_type.calorie_share()) as i32
   }
}

/// 栄養素の合計
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NutritionTotals {
   pub calories:  i64,
   pub protein_g: f64,
   pub carbs_g:   f64,
   pub fat_g:     f64,
}

impl NutritionTotals {
   pub fn new(calories: i64, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
      Self {
         calories,
         protein_g,
         carbs_g,
         fat_g,
      }
   }

   /// 保存済みの食事から合計する（未設定の値は 0 として扱う）
   pub fn of_meals<'a>(meals: impl IntoIterator<Item = &'a Meal>) -> Self {
      meals
         .into_iter()
         .map(|m| {
            Self::new(
               m.calories.map_or(0, i64::from),
               m.protein_g.unwrap_or(0.0),
               m.carbs_g.unwrap_or(0.0),
               m.fat_g.unwrap_or(0.0),
            )
         })
         .sum()
   }
}

impl std::ops::Add for NutritionTotals {
   type Output = Self;

   fn add(self, rhs: Self) -> Self {
      Self {
         calories:  self.calories + rhs.calories,
         protein_g: self.protein_g + rhs.protein_g,
         carbs_g:   self.carbs_g + rhs.carbs_g,
         fat_g:     self.fat_g + rhs.fat_g,
      }
   }
}

impl std::iter::Sum for NutritionTotals {
   fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
      iter.fold(Self::default(), |acc, x| acc + x)
   }
}
