//! # 食事の嗜好・制限
//!
//! `dietary_preferences` の行を種別ごとに振り分け、
//! 食事生成とレシピ提案のコンテキストに使う。

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::user::UserId;

define_uuid_id! {
   /// 食事嗜好の一意識別子
   pub struct DietaryPreferenceId("食事嗜好 ID");
}

/// 嗜好の種別
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PreferenceKind {
   /// 食事制限（例: vegetarian）
   Restriction,
   /// アレルギー
   Allergy,
   /// 好み
   Preference,
}

/// 食事嗜好エンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct DietaryPreference {
   pub id:      DietaryPreferenceId,
   pub user_id: UserId,
   pub kind:    PreferenceKind,
   pub value:   String,
}

/// 種別ごとに振り分けた食事嗜好
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DietaryProfile {
   pub restrictions: Vec<String>,
   pub allergies:    Vec<String>,
   pub preferences:  Vec<String>,
}

impl DietaryProfile {
   pub fn from_preferences(preferences: &[DietaryPreference]) -> Self {
      let mut profile = Self::default();
      for p in preferences {
         let bucket = match p.kind {
            PreferenceKind::Restriction => &mut profile.restrictions,
            PreferenceKind::Allergy => &mut profile.allergies,
            PreferenceKind::Preference => &mut profile.preferences,
         };
         bucket.push(p.value.clone());
      }
      profile
   }

   /// 制限とアレルギーを合わせた一覧（レシピ提案の検索条件）
   pub fn restrictions_and_allergies(&self) -> Vec<&str> {
      self.restrictions
         .iter()
         .chain(&self.allergies)
         .map(String::as_str)
         .collect()
   }
}

/// プロンプト用に一覧を連結する（空なら `"None"`）
pub fn join_or_none(values: &[String]) -> String {
   if values.is_empty() {
      "None".to_string()
   } else {
      values.join(", ")
   }
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;

   use super::*;

   fn pref(kind: PreferenceKind, value: &str) -> DietaryPreference {
      DietaryPreference {
         id: DietaryPreferenceId::new(),
         user_id: UserId::new(),
         kind,
         value: value.to_string(),
      }
   }

   #[test]
   fn test_from_preferencesで種別ごとに振り分ける() {
      let profile = DietaryProfile::from_preferences(&[
         pref(PreferenceKind::Restriction, "vegetarian"),
         pref(PreferenceKind::Allergy, "peanut"),
         pref(PreferenceKind::Preference, "spicy"),
         pref(PreferenceKind::Restriction, "low-sodium"),
      ]);

      assert_eq!(profile.restrictions, vec!["vegetarian", "low-sodium"]);
      assert_eq!(profile.allergies, vec!["peanut"]);
      assert_eq!(profile.preferences, vec!["spicy"]);
      assert_eq!(
         profile.restrictions_and_allergies(),
         vec!["vegetarian", "low-sodium", "peanut"]
      );
   }

   #[test]
   fn test_join_or_none_空ならnone() {
      assert_eq!(join_or_none(&[]), "None");
      assert_eq!(
         join_or_none(&["a".to_string(), "b".to_string()]),
         "a, b"
      );
   }
}
