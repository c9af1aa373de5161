//! # Strava 連携ユースケース
//!
//! OAuth 接続、統計・アクティビティの取得、ワークアウトへの同期、
//! ワークアウトのアクティビティ登録、切断を扱う。
//!
//! ## トークンの更新
//!
//! トークンを使う呼び出しの直前に有効期限を確認し、期限切れなら
//! リフレッシュを 1 回だけ行って新しいトークンを保存してから本来の API を呼ぶ。

use std::sync::Arc;

use chrono::Duration;
use fitplan_domain::{
   activity::{NewStravaActivity, StravaActivity},
   clock::Clock,
   integration::{ExternalIntegration, IntegrationId, Provider, SyncSummary},
   user::UserId,
   workout::WorkoutId,
};
use fitplan_infra::{
   db::TransactionManager,
   repository::{IntegrationRepository, WorkoutRepository},
};
use fitplan_shared::{event_log::event, log_business_event};
use url::Url;

use super::helpers::FindResultExt;
use crate::{
   client::{Athlete, StravaClient},
   error::BffError,
};

/// 取得・同期の対象期間（日数）の範囲
pub const ACTIVITY_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=90;
/// 取得・同期の対象期間の既定値
pub const DEFAULT_ACTIVITY_DAYS: i64 = 7;
const ACTIVITIES_PER_PAGE: u32 = 30;
const INTEGRATION_ENTITY: &str = "Strava integration";

/// アスリート情報と統計
#[derive(Debug, Clone, PartialEq)]
pub struct AthleteStats {
   pub athlete: Athlete,
   pub stats:   serde_json::Value,
}

/// Strava 連携ユースケース
pub struct StravaUseCaseImpl {
   strava:       Arc<dyn StravaClient>,
   integrations: Arc<dyn IntegrationRepository>,
   workouts:     Arc<dyn WorkoutRepository>,
   tx_manager:   Arc<dyn TransactionManager>,
   clock:        Arc<dyn Clock>,
}

impl StravaUseCaseImpl {
   pub fn new(
      strava: Arc<dyn StravaClient>,
      integrations: Arc<dyn IntegrationRepository>,
      workouts: Arc<dyn WorkoutRepository>,
      tx_manager: Arc<dyn TransactionManager>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         strava,
         integrations,
         workouts,
         tx_manager,
         clock,
      }
   }

   /// 認可画面の URL を返す
   ///
   /// `state` は `"{user_id}:{UNIX 秒}"`。
   pub fn connect(&self, user_id: &UserId, redirect_uri: &str) -> Result<Url, BffError> {
      let state = format!("{user_id}:{}", self.clock.now().timestamp());
      Ok(self.strava.authorization_url(redirect_uri, &state)?)
   }

   /// 認可コードを交換して連携を保存する（既存の連携は上書き）
   pub async fn callback(
      &self,
      user_id: &UserId,
      code: &str,
   ) -> Result<ExternalIntegration, BffError> {
      let response = self.strava.exchange_code(code).await?;
      let integration = ExternalIntegration::connect(
         IntegrationId::new(),
         user_id.clone(),
         Provider::Strava,
         response.tokens()?,
         response.metadata(),
         self.clock.now(),
      );

      let mut tx = self.tx_manager.begin(user_id).await?;
      let saved = self.integrations.upsert(&mut tx, &integration).await?;
      tx.commit().await?;

      log_business_event!(
         event.category = event::category::INTEGRATION,
         event.action = event::action::STRAVA_CONNECTED,
         event.entity_type = event::entity_type::INTEGRATION,
         event.entity_id = %saved.id(),
         event.user_id = %user_id,
         event.result = event::result::SUCCESS,
         "Strava を接続"
      );

      Ok(saved)
   }

   async fn integration(&self, user_id: &UserId) -> Result<ExternalIntegration, BffError> {
      self.integrations
         .find_by_provider(user_id, Provider::Strava)
         .await
         .or_not_found(INTEGRATION_ENTITY)
   }

   /// 有効なアクセストークンを返す（期限切れなら更新して保存する）
   async fn access_token(
      &self,
      user_id: &UserId,
   ) -> Result<(ExternalIntegration, String), BffError> {
      let integration = self.integration(user_id).await?;
      if !integration.needs_refresh(self.clock.now()) {
         let token = integration.access_token().to_string();
         return Ok((integration, token));
      }

      let tokens = self
         .strava
         .refresh_token(&integration.tokens().refresh_token)
         .await?
         .tokens()?;

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.integrations
         .update_tokens(&mut tx, integration.id(), &tokens)
         .await?;
      tx.commit().await?;

      log_business_event!(
         event.category = event::category::INTEGRATION,
         event.action = event::action::STRAVA_TOKEN_REFRESHED,
         event.entity_type = event::entity_type::INTEGRATION,
         event.entity_id = %integration.id(),
         event.user_id = %user_id,
         event.result = event::result::SUCCESS,
         "Strava のトークンを更新"
      );

      let token = tokens.access_token.clone();
      Ok((integration.with_tokens(tokens), token))
   }

   pub async fn stats(&self, user_id: &UserId) -> Result<AthleteStats, BffError> {
      let (_, token) = self.access_token(user_id).await?;
      let athlete = self.strava.get_athlete(&token).await?;
      let stats = self.strava.get_athlete_stats(&token, athlete.id).await?;
      Ok(AthleteStats { athlete, stats })
   }

   /// 直近 `days` 日のアクティビティを取得する
   pub async fn activities(
      &self,
      user_id: &UserId,
      days: i64,
   ) -> Result<Vec<StravaActivity>, BffError> {
      let after = self.since(days)?;
      let (_, token) = self.access_token(user_id).await?;
      Ok(self
         .strava
         .list_activities(&token, after, ACTIVITIES_PER_PAGE)
         .await?)
   }

   /// 直近 `days` 日のアクティビティを実施済みワークアウトとして取り込む
   ///
   /// 取り込み済みのアクティビティは読み飛ばす。最終同期日時は件数によらず更新する。
   /// 取り込みと最終同期日時の更新は 1 トランザクションで書き込むため、
   /// 途中で失敗した同期は何も残さない（同じ期間で再実行できる）。
   pub async fn sync(&self, user_id: &UserId, days: i64) -> Result<SyncSummary, BffError> {
      let after = self.since(days)?;
      let (integration, token) = self.access_token(user_id).await?;
      let activities = self
         .strava
         .list_activities(&token, after, ACTIVITIES_PER_PAGE)
         .await?;

      let now = self.clock.now();
      let mut summary = SyncSummary::default();
      let mut tx = self.tx_manager.begin(user_id).await?;
      for activity in &activities {
         let workout = match activity.to_new_workout() {
            Ok(w) => w.into_workout(WorkoutId::new(), user_id.clone(), now),
            Err(e) => {
               tracing::warn!(
                  activity_id = activity.id,
                  "取り込めないアクティビティを読み飛ばします: {}",
                  e
               );
               summary.record(false);
               continue;
            }
         };
         let inserted = self.workouts.insert_synced(&mut tx, &workout).await?;
         summary.record(inserted);
      }
      self.integrations
         .touch_last_synced(&mut tx, integration.id(), now)
         .await?;
      tx.commit().await?;

      log_business_event!(
         event.category = event::category::INTEGRATION,
         event.action = event::action::STRAVA_SYNCED,
         event.entity_type = event::entity_type::INTEGRATION,
         event.entity_id = %integration.id(),
         event.user_id = %user_id,
         event.result = event::result::SUCCESS,
         synced = summary.synced,
         skipped = summary.skipped,
         "Strava のアクティビティを同期"
      );

      Ok(summary)
   }

   /// ワークアウトを Strava のアクティビティとして登録する
   pub async fn create_activity(
      &self,
      user_id: &UserId,
      workout_id: &WorkoutId,
   ) -> Result<serde_json::Value, BffError> {
      let workout = self
         .workouts
         .find_by_id(user_id, workout_id)
         .await
         .or_not_found("Workout")?;
      let (_, token) = self.access_token(user_id).await?;

      let activity = self
         .strava
         .create_activity(&token, &NewStravaActivity::from_workout(&workout))
         .await?;

      log_business_event!(
         event.category = event::category::INTEGRATION,
         event.action = event::action::STRAVA_ACTIVITY_PUSHED,
         event.entity_type = event::entity_type::WORKOUT,
         event.entity_id = %workout.id,
         event.user_id = %user_id,
         event.result = event::result::SUCCESS,
         "ワークアウトを Strava に登録"
      );

      Ok(activity)
   }

   pub async fn disconnect(&self, user_id: &UserId) -> Result<(), BffError> {
      let mut tx = self.tx_manager.begin(user_id).await?;
      let deleted = self
         .integrations
         .delete_by_provider(&mut tx, user_id, Provider::Strava)
         .await?;
      tx.commit().await?;

      if !deleted {
         return Err(BffError::NotFound(format!("{INTEGRATION_ENTITY} not found")));
      }

      log_business_event!(
         event.category = event::category::INTEGRATION,
         event.action = event::action::STRAVA_DISCONNECTED,
         event.entity_type = event::entity_type::INTEGRATION,
         event.user_id = %user_id,
         event.result = event::result::SUCCESS,
         "Strava を切断"
      );
      Ok(())
   }

   fn since(&self, days: i64) -> Result<chrono::DateTime<chrono::Utc>, BffError> {
      if !ACTIVITY_DAYS_RANGE.contains(&days) {
         return Err(BffError::BadRequest(format!(
            "days must be between {} and {}",
            ACTIVITY_DAYS_RANGE.start(),
            ACTIVITY_DAYS_RANGE.end()
         )));
      }
      Ok(self.clock.now() - Duration::days(days))
   }
}
