//! 外部連携一覧ユースケース
//!
//! プロバイダを問わない一覧と ID 指定の切断。トークンはハンドラ側で落とす。

use std::sync::Arc;

use fitplan_domain::{
   integration::{ExternalIntegration, IntegrationId},
   user::UserId,
};
use fitplan_infra::{db::TransactionManager, repository::IntegrationRepository};
use fitplan_shared::{event_log::event, log_business_event};

use super::helpers::ensure_deleted;
use crate::error::BffError;

pub struct IntegrationUseCaseImpl {
   integrations: Arc<dyn IntegrationRepository>,
   tx_manager:   Arc<dyn TransactionManager>,
}

impl IntegrationUseCaseImpl {
   pub fn new(
      integrations: Arc<dyn IntegrationRepository>,
      tx_manager: Arc<dyn TransactionManager>,
   ) -> Self {
      Self {
         integrations,
         tx_manager,
      }
   }

   pub async fn list(&self, user_id: &UserId) -> Result<Vec<ExternalIntegration>, BffError> {
      Ok(self.integrations.find_all_by_user(user_id).await?)
   }

   /// ID 指定で連携を削除する（本人の行でなければ 404）
   pub async fn disconnect(&self, user_id: &UserId, id: &IntegrationId) -> Result<(), BffError> {
      let mut tx = self.tx_manager.begin(user_id).await?;
      let deleted = self.integrations.delete_by_id(&mut tx, user_id, id).await?;
      tx.commit().await?;

      ensure_deleted(deleted, "Integration")?;

      log_business_event!(
         event.category = event::category::INTEGRATION,
         event.action = event::action::INTEGRATION_DISCONNECTED,
         event.entity_type = event::entity_type::INTEGRATION,
         event.entity_id = %id,
         event.user_id = %user_id,
         event.result = event::result::SUCCESS,
         "外部連携を切断"
      );

      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use chrono::{TimeZone, Utc};
   use fitplan_domain::integration::{IntegrationMetadata, OAuthTokens, Provider};
   use fitplan_infra::mock::{MockIntegrationRepository, MockTransactionManager};
   use pretty_assertions::assert_eq;

   use super::*;

   fn strava(user_id: &UserId) -> ExternalIntegration {
      let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
      ExternalIntegration::connect(
         IntegrationId::new(),
         user_id.clone(),
         Provider::Strava,
         OAuthTokens {
            access_token:  "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at:    now,
         },
         IntegrationMetadata::default(),
         now,
      )
   }

   fn sut(repo: &MockIntegrationRepository) -> IntegrationUseCaseImpl {
      IntegrationUseCaseImpl::new(
         Arc::new(repo.clone()),
         Arc::new(MockTransactionManager::new()),
      )
   }

   #[tokio::test]
   async fn test_list_本人の連携だけを返す() {
      let repo = MockIntegrationRepository::new();
      let user_id = UserId::new();
      let mine = strava(&user_id);
      repo.add_integration(mine.clone());
      repo.add_integration(strava(&UserId::new()));

      let integrations = sut(&repo).list(&user_id).await.unwrap();

      assert_eq!(integrations, vec![mine]);
   }

   #[tokio::test]
   async fn test_disconnect_削除後は一覧から消える() {
      let repo = MockIntegrationRepository::new();
      let user_id = UserId::new();
      let integration = strava(&user_id);
      repo.add_integration(integration.clone());
      let sut = sut(&repo);

      sut.disconnect(&user_id, integration.id()).await.unwrap();

      assert_eq!(sut.list(&user_id).await.unwrap(), vec![]);
   }

   #[tokio::test]
   async fn test_disconnect_他ユーザーの連携はnot_found() {
      let repo = MockIntegrationRepository::new();
      let integration = strava(&UserId::new());
      repo.add_integration(integration.clone());

      let err = sut(&repo)
         .disconnect(&UserId::new(), integration.id())
         .await
         .unwrap_err();

      assert!(matches!(err, BffError::NotFound(msg) if msg == "Integration not found"));
   }
}
