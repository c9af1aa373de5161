//! # プロフィール
//!
//! ユーザーごとに 1 行だけ存在する身体情報と活動レベル。
//! 初回の `GET /api/profile/me` で認証プロバイダのメールアドレスから作成され、
//! 以降はその場で更新される（削除しない）。
//!
//! 身体情報はエネルギー目標の計算（[`crate::nutrition`]）と
//! 生成プロンプトのコンテキストに使われる。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
   DomainError,
   user::{Email, UserId},
};

define_validated_string! {
   /// プロフィールの表示名
   ///
   /// PII のため Debug 出力はマスクされる。
   pub struct DisplayName {
      label: "表示名",
      max_length: 100,
      pii: true,
   }
}

/// 性別
///
/// BMR の補正値（女性 −161、それ以外 +5）を決める。
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
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Gender {
   Male,
   Female,
   Other,
}

/// 活動レベル
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
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ActivityLevel {
   Sedentary,
   Light,
   Moderate,
   Active,
   VeryActive,
}

impl ActivityLevel {
   /// 総消費エネルギーを求めるための BMR 係数
   pub fn multiplier(self) -> f64 {
      match self {
         Self::Sedentary => 1.2,
         Self::Light => 1.375,
         Self::Moderate => 1.55,
         Self::Active => 1.725,
         Self::VeryActive => 1.9,
      }
   }
}

/// プロフィールの部分更新
///
/// `None` のフィールドは変更しない。
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
   pub display_name:   Option<DisplayName>,
   pub height_cm:      Option<i32>,
   pub weight_kg:      Option<f64>,
   pub age:            Option<i32>,
   pub gender:         Option<Gender>,
   pub activity_level: Option<ActivityLevel>,
}

impl ProfileUpdate {
   fn validate(&self) -> Result<(), DomainError> {
      if let Some(height) = self.height_cm
         && !(1..=300).contains(&height)
      {
         return Err(DomainError::Validation(
            "身長は 1〜300 cm で入力してください".to_string(),
         ));
      }
      if let Some(weight) = self.weight_kg
         && !(weight > 0.0 && weight <= 500.0)
      {
         return Err(DomainError::Validation(
            "体重は 0〜500 kg で入力してください".to_string(),
         ));
      }
      if let Some(age) = self.age
         && !(1..=150).contains(&age)
      {
         return Err(DomainError::Validation(
            "年齢は 1〜150 で入力してください".to_string(),
         ));
      }
      Ok(())
   }
}

/// プロフィールエンティティ
///
/// # 不変条件
///
/// - `id` は所有ユーザーの ID と一致する（1 ユーザー 1 行）
/// - 数値項目は [`ProfileUpdate`] の範囲チェックを通過した値のみ
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
   id:             UserId,
   email:          Email,
   display_name:   Option<DisplayName>,
   height_cm:      Option<i32>,
   weight_kg:      Option<f64>,
   age:            Option<i32>,
   gender:         Option<Gender>,
   activity_level: Option<ActivityLevel>,
   created_at:     DateTime<Utc>,
   updated_at:     DateTime<Utc>,
}

impl Profile {
   /// 初回アクセス時のプロフィールを作成する
   pub fn provision(id: UserId, email: Email, now: DateTime<Utc>) -> Self {
      Self {
         id,
         email,
         display_name: None,
         height_cm: None,
         weight_kg: None,
         age: None,
         gender: None,
         activity_level: None,
         created_at: now,
         updated_at: now,
      }
   }

   /// データベースからプロフィールを復元する
   #[allow(clippy::too_many_arguments)]
   pub fn from_db(
      id: UserId,
      email: Email,
      display_name: Option<DisplayName>,
      height_cm: Option<i32>,
      weight_kg: Option<f64>,
      age: Option<i32>,
      gender: Option<Gender>,
      activity_level: Option<ActivityLevel>,
      created_at: DateTime<Utc>,
      updated_at: DateTime<Utc>,
   ) -> Self {
      Self {
         id,
         email,
         display_name,
         height_cm,
         weight_kg,
         age,
         gender,
         activity_level,
         created_at,
         updated_at,
      }
   }

   /// 部分更新を適用した新インスタンスを返す
   pub fn updated(self, update: ProfileUpdate, now: DateTime<Utc>) -> Result<Self, DomainError> {
      update.validate()?;

      Ok(Self {
         display_name: update.display_name.or(self.display_name),
         height_cm: update.height_cm.or(self.height_cm),
         weight_kg: update.weight_kg.or(self.weight_kg),
         age: update.age.or(self.age),
         gender: update.gender.or(self.gender),
         activity_level: update.activity_level.or(self.activity_level),
         updated_at: now,
         ..self
      })
   }

   // --- ゲッター ---

   pub fn id(&self) -> &UserId {
      &self.id
   }

   pub fn email(&self) -> &Email {
      &self.email
   }

   pub fn display_name(&self) -> Option<&DisplayName> {
      self.display_name.as_ref()
   }

   pub fn height_cm(&self) -> Option<i32> {
      self.height_cm
   }

   pub fn weight_kg(&self) -> Option<f64> {
      self.weight_kg
   }

   pub fn age(&self) -> Option<i32> {
      self.age
   }

   pub fn gender(&self) -> Option<Gender> {
      self.gender
   }

   pub fn activity_level(&self) -> Option<ActivityLevel> {
      self.activity_level
   }

   pub fn created_at(&self) -> DateTime<Utc> {
      self.created_at
   }

   pub fn updated_at(&self) -> DateTime<Utc> {
      self.updated_at
   }
}

#[cfg(test)]
mod tests {
   use chrono::TimeZone;
   use pretty_assertions::assert_eq;
   use rstest::{fixture, rstest};

   use super::*;

   #[fixture]
   fn now() -> DateTime<Utc> {
      Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
   }

   #[fixture]
   fn profile(now: DateTime<Utc>) -> Profile {
      Profile::provision(
         UserId::new(),
         Email::new("runner@example.com").unwrap(),
         now,
      )
   }

   #[rstest]
   fn test_provisionで身体情報は未設定(profile: Profile, now: DateTime<Utc>) {
      assert_eq!(profile.height_cm(), None);
      assert_eq!(profile.activity_level(), None);
      assert_eq!(profile.created_at(), now);
      assert_eq!(profile.updated_at(), now);
   }

   #[rstest]
   fn test_updatedは指定したフィールドのみ変更する(profile: Profile) {
      let later = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
      let first = profile
         .updated(
            ProfileUpdate {
               height_cm: Some(172),
               weight_kg: Some(68.5),
               ..Default::default()
            },
            later,
         )
         .unwrap();

      let second = first
         .updated(
            ProfileUpdate {
               activity_level: Some(ActivityLevel::Active),
               ..Default::default()
            },
            later,
         )
         .unwrap();

      assert_eq!(second.height_cm(), Some(172));
      assert_eq!(second.weight_kg(), Some(68.5));
      assert_eq!(second.activity_level(), Some(ActivityLevel::Active));
      assert_eq!(second.updated_at(), later);
   }

   #[rstest]
   #[case(ProfileUpdate { height_cm: Some(0), ..Default::default() })]
   #[case(ProfileUpdate { weight_kg: Some(-1.0), ..Default::default() })]
   #[case(ProfileUpdate { age: Some(200), ..Default::default() })]
   fn test_範囲外の値はバリデーションエラー(
      profile: Profile,
      now: DateTime<Utc>,
      #[case] update: ProfileUpdate,
   ) {
      let result = profile.updated(update, now);

      assert!(matches!(result, Err(DomainError::Validation(_))));
   }

   #[rstest]
   #[case("sedentary", 1.2)]
   #[case("light", 1.375)]
   #[case("moderate", 1.55)]
   #[case("active", 1.725)]
   #[case("very_active", 1.9)]
   fn test_活動レベルの係数(#[case] raw: &str, #[case] expected: f64) {
      let level: ActivityLevel = raw.parse().unwrap();
      assert_eq!(level.multiplier(), expected);
   }

   #[test]
   fn test_性別はsnake_caseで文字列化される() {
      assert_eq!(Gender::Female.to_string(), "female");
      assert_eq!("other".parse::<Gender>().unwrap(), Gender::Other);
   }
}
