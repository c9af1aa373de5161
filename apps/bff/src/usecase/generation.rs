//! # 生成の共通処理
//!
//! ワークアウト・食事の生成で共有する処理。
//!
//! 1. プロフィール・目標・食事の好みを読み込む（[`UserContextLoader`]）
//! 2. プロンプトを組み立てる（[`super::prompt`]）
//! 3. LLM を呼び出し、応答を型付きの成果物に変換する（[`generate`]）
//!
//! 再試行はしない。応答が必須フィールドを欠く場合は
//! [`GenerationError::Schema`] として呼び出し元に返る。

use std::sync::Arc;

use fitplan_domain::{
   DomainError,
   dietary::DietaryProfile,
   generation::{GeneratedArtifact, GenerationSchemaError, parse_artifact},
   goal::Goal,
   nutrition::{BodyMetrics, EnergyTarget},
   profile::Profile,
   user::UserId,
};
use fitplan_infra::repository::{DietaryPreferenceRepository, GoalRepository, ProfileRepository};
use thiserror::Error;

use crate::{
   client::{ChatRequest, LlmClient, LlmError},
   error::BffError,
};

/// 生成エラー
#[derive(Debug, Error)]
pub enum GenerationError {
   /// LLM 呼び出しの失敗
   #[error(transparent)]
   Llm(#[from] LlmError),

   /// 応答が期待する形式ではない
   #[error(transparent)]
   Schema(#[from] GenerationSchemaError),

   /// 生成結果が保存できる値ではない（空のタイトルなど）
   #[error("生成結果を保存できません: {0}")]
   Artifact(DomainError),
}

/// 生成時の追加条件（プロンプトにそのまま JSON で埋め込む）
pub type Preferences = serde_json::Map<String, serde_json::Value>;

/// 生成に使うユーザー情報
#[derive(Debug, Clone, Default)]
pub struct UserContext {
   /// 未作成なら `None`（既定値で計算する）
   pub profile: Option<Profile>,
   pub goals:   Vec<Goal>,
   pub dietary: DietaryProfile,
}

impl UserContext {
   pub fn body_metrics(&self) -> BodyMetrics {
      BodyMetrics::from_profile(self.profile.as_ref())
   }

   pub fn energy_target(&self) -> EnergyTarget {
      EnergyTarget::compute(&self.body_metrics(), &self.goals)
   }
}

/// [`UserContext`] の読み込み
///
/// プロフィールが未作成でも作成はしない。
pub struct UserContextLoader {
   profiles: Arc<dyn ProfileRepository>,
   goals:    Arc<dyn GoalRepository>,
   dietary:  Arc<dyn DietaryPreferenceRepository>,
}

impl UserContextLoader {
   pub fn new(
      profiles: Arc<dyn ProfileRepository>,
      goals: Arc<dyn GoalRepository>,
      dietary: Arc<dyn DietaryPreferenceRepository>,
   ) -> Self {
      Self {
         profiles,
         goals,
         dietary,
      }
   }

   pub async fn load(&self, user_id: &UserId) -> Result<UserContext, BffError> {
      let profile = self.profiles.find_by_id(user_id).await?;
      let goals = self.goals.find_all_by_user(user_id).await?;
      let preferences = self.dietary.find_all_by_user(user_id).await?;

      Ok(UserContext {
         profile,
         goals,
         dietary: DietaryProfile::from_preferences(&preferences),
      })
   }
}

/// LLM を呼び出し、応答を成果物 `T` に変換する
#[tracing::instrument(skip_all, fields(artifact = T::NAME))]
pub(crate) async fn generate<T: GeneratedArtifact>(
   llm: &dyn LlmClient,
   request: ChatRequest,
) -> Result<T, GenerationError> {
   let content = llm.complete_json(request).await?;
   let artifact = parse_artifact::<T>(&content)?;
   tracing::debug!("生成結果を検証しました");
   Ok(artifact)
}

#[cfg(test)]
mod tests {
   use fitplan_domain::{
      dietary::{DietaryPreference, DietaryPreferenceId, PreferenceKind},
      generation::GeneratedWorkout,
   };
   use fitplan_infra::mock::{
      MockDietaryPreferenceRepository,
      MockGoalRepository,
      MockProfileRepository,
   };
   use pretty_assertions::assert_eq;

   use super::*;
   use crate::usecase::test_support::StubLlm;

   #[tokio::test]
   async fn test_load_プロフィール未作成でも既定値で読み込める() {
      let dietary = MockDietaryPreferenceRepository::new();
      let user_id = UserId::new();
      dietary.add_preference(DietaryPreference {
         id:      DietaryPreferenceId::new(),
         user_id: user_id.clone(),
         kind:    PreferenceKind::Allergy,
         value:   "shellfish".to_string(),
      });
      let loader = UserContextLoader::new(
         Arc::new(MockProfileRepository::new()),
         Arc::new(MockGoalRepository::new()),
         Arc::new(dietary),
      );

      let context = loader.load(&user_id).await.unwrap();

      assert!(context.profile.is_none());
      assert_eq!(context.dietary.allergies, vec!["shellfish"]);
      assert_eq!(context.body_metrics().weight_kg, 70.0);
   }

   #[tokio::test]
   async fn test_generate_応答を成果物に変換する() {
      let llm = StubLlm::new();

      let workout: GeneratedWorkout = generate(
         &llm,
         ChatRequest {
            system:      "You are an expert fitness trainer and workout planner.".into(),
            user:        "Generate a personalized workout".into(),
            temperature: 0.7,
         },
      )
      .await
      .unwrap();

      assert_eq!(workout.title, "Full Body Strength");
      assert_eq!(workout.exercises.len(), 2);
   }

   #[tokio::test]
   async fn test_generate_必須フィールドの欠落はスキーマエラー() {
      let llm = StubLlm::responding(r#"{"title": "Run"}"#);

      let err = generate::<GeneratedWorkout>(
         &llm,
         ChatRequest {
            system:      String::new(),
            user:        String::new(),
            temperature: 0.7,
         },
      )
      .await
      .unwrap_err();

      assert!(matches!(
         err,
         GenerationError::Schema(GenerationSchemaError::MissingField {
            field: "description",
            ..
         })
      ));
   }

   #[tokio::test]
   async fn test_generate_jsonでない応答はinvalid_json() {
      let llm = StubLlm::responding("not json");

      let err = generate::<GeneratedWorkout>(
         &llm,
         ChatRequest {
            system:      String::new(),
            user:        String::new(),
            temperature: 0.7,
         },
      )
      .await
      .unwrap_err();

      assert!(matches!(
         err,
         GenerationError::Schema(GenerationSchemaError::InvalidJson(_))
      ));
   }
}
