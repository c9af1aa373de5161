//! # 目標
//!
//! ユーザーが登録するフィットネス目標。生成プロンプトのコンテキストになり、
//! 食事のエネルギー目標の補正（減量 ×0.85 / 増量 ×1.1）にも使われる。

use chrono::{DateTime, NaiveDate, Utc};

use crate::user::UserId;

define_uuid_id! {
   /// 目標の一意識別子
   pub struct GoalId("目標 ID");
}

/// 減量目標の種別名
pub const LOSE_WEIGHT: &str = "Lose Weight";

/// 増量（筋肥大）目標の種別名
pub const BUILD_MUSCLE: &str = "Build Muscle";

define_validated_string! {
   /// 目標の種別（自由記述、例: `"Lose Weight"`）
   pub struct GoalType {
      label: "目標種別",
      max_length: 100,
   }
}

/// 目標エンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
   pub id:            GoalId,
   pub user_id:       UserId,
   pub goal_type:     String,
   pub target_value:  Option<f64>,
   pub current_value: Option<f64>,
   pub unit:          Option<String>,
   pub deadline:      Option<NaiveDate>,
   pub created_at:    DateTime<Utc>,
   pub updated_at:    DateTime<Utc>,
}

/// 目標の作成入力
#[derive(Debug, Clone)]
pub struct NewGoal {
   pub goal_type:     GoalType,
   pub target_value:  Option<f64>,
   pub current_value: Option<f64>,
   pub unit:          Option<String>,
   pub deadline:      Option<NaiveDate>,
}

impl NewGoal {
   /// 新しい目標エンティティを作成する
   pub fn into_goal(self, id: GoalId, user_id: UserId, now: DateTime<Utc>) -> Goal {
      Goal {
         id,
         user_id,
         goal_type: self.goal_type.into_string(),
         target_value: self.target_value,
         current_value: self.current_value,
         unit: self.unit,
         deadline: self.deadline,
         created_at: now,
         updated_at: now,
      }
   }
}

/// 目標の一覧から種別名だけを取り出す
pub fn goal_types(goals: &[Goal]) -> Vec<&str> {
   goals.iter().map(|g| g.goal_type.as_str()).collect()
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;

   use super::*;

   #[test]
   fn test_into_goalで作成日時と更新日時が揃う() {
      let now = Utc::now();
      let goal = NewGoal {
         goal_type:     GoalType::new(LOSE_WEIGHT).unwrap(),
         target_value:  Some(65.0),
         current_value: Some(72.0),
         unit:          Some("kg".to_string()),
         deadline:      None,
      }
      .into_goal(GoalId::new(), UserId::new(), now);

      assert_eq!(goal.goal_type, "Lose Weight");
      assert_eq!(goal.created_at, goal.updated_at);
      assert_eq!(goal_types(&[goal]), vec!["Lose Weight"]);
   }

   #[test]
   fn test_空の種別はエラー() {
      assert!(GoalType::new("").is_err());
   }
}
