//! # 外部連携
//!
//! 外部フィットネスサービス（現在は Strava のみ）の OAuth 資格情報。
//!
//! ## 状態遷移
//!
//! ```text
//! 未接続 ──connect──▶ 接続済み ──期限切れ──▶ 期限切れ ──refresh──▶ 接続済み
//!                        │
//!                        └──disconnect──▶ 行を削除
//! ```
//!
//! `(user_id, provider)` で一意。再接続は既存の資格情報を上書きする。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::user::UserId;

define_uuid_id! {
   /// 外部連携の一意識別子
   pub struct IntegrationId("連携 ID");
}

/// 連携先プロバイダ
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
   Strava,
}

/// OAuth トークンの組
///
/// Debug 出力ではトークン値をマスクする。
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthTokens {
   pub access_token:  String,
   pub refresh_token: String,
   pub expires_at:    DateTime<Utc>,
}

impl std::fmt::Debug for OAuthTokens {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("OAuthTokens")
         .field("access_token", &"[REDACTED]")
         .field("refresh_token", &"[REDACTED]")
         .field("expires_at", &self.expires_at)
         .finish()
   }
}

/// 連携先アカウントの情報（`metadata` 列に JSON で保存）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationMetadata {
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub athlete_id:   Option<i64>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub athlete_name: Option<String>,
}

/// 外部連携エンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalIntegration {
   id:             IntegrationId,
   user_id:        UserId,
   provider:       Provider,
   tokens:         OAuthTokens,
   connected_at:   DateTime<Utc>,
   last_synced_at: Option<DateTime<Utc>>,
   is_active:      bool,
   metadata:       IntegrationMetadata,
}

impl ExternalIntegration {
   /// 新規接続
   pub fn connect(
      id: IntegrationId,
      user_id: UserId,
      provider: Provider,
      tokens: OAuthTokens,
      metadata: IntegrationMetadata,
      now: DateTime<Utc>,
   ) -> Self {
      Self {
         id,
         user_id,
         provider,
         tokens,
         connected_at: now,
         last_synced_at: None,
         is_active: true,
         metadata,
      }
   }

   /// データベースから復元する
   #[allow(clippy::too_many_arguments)]
   pub fn from_db(
      id: IntegrationId,
      user_id: UserId,
      provider: Provider,
      tokens: OAuthTokens,
      connected_at: DateTime<Utc>,
      last_synced_at: Option<DateTime<Utc>>,
      is_active: bool,
      metadata: IntegrationMetadata,
   ) -> Self {
      Self {
         id,
         user_id,
         provider,
         tokens,
         connected_at,
         last_synced_at,
         is_active,
         metadata,
      }
   }

   /// アクセストークンの更新が必要か
   ///
   /// 期限ちょうども期限切れとして扱う。
   pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
      now >= self.tokens.expires_at
   }

   /// 更新後のトークンに差し替えた新インスタンスを返す
   pub fn with_tokens(self, tokens: OAuthTokens) -> Self {
      Self { tokens, ..self }
   }

   // --- ゲッター ---

   pub fn id(&self) -> &IntegrationId {
      &self.id
   }

   pub fn user_id(&self) -> &UserId {
      &self.user_id
   }

   pub fn provider(&self) -> Provider {
      self.provider
   }

   pub fn tokens(&self) -> &OAuthTokens {
      &self.tokens
   }

   pub fn access_token(&self) -> &str {
      &self.tokens.access_token
   }

   pub fn connected_at(&self) -> DateTime<Utc> {
      self.connected_at
   }

   pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
      self.last_synced_at
   }

   pub fn is_active(&self) -> bool {
      self.is_active
   }

   pub fn metadata(&self) -> &IntegrationMetadata {
      &self.metadata
   }
}

/// 同期結果の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SyncSummary {
   /// 新規に取り込んだ件数
   pub synced:  u32,
   /// 取り込み済みのため読み飛ばした件数
   pub skipped: u32,
   /// 取得したアクティビティの総数
   pub total:   u32,
}

impl SyncSummary {
   pub fn record(&mut self, inserted: bool) {
      self.total += 1;
      if inserted {
         self.synced += 1;
      } else {
         self.skipped += 1;
      }
   }
}

#[cfg(test)]
mod tests {
   use chrono::{Duration, TimeZone};
   use pretty_assertions::assert_eq;
   use rstest::rstest;

   use super::*;

   fn integration(expires_at: DateTime<Utc>) -> ExternalIntegration {
      ExternalIntegration::connect(
         IntegrationId::new(),
         UserId::new(),
         Provider::Strava,
         OAuthTokens {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
         },
         IntegrationMetadata::default(),
         expires_at - Duration::hours(6),
      )
   }

   #[rstest]
   #[case(-1, false)]
   #[case(0, true)]
   #[case(1, true)]
   fn test_期限ちょうど以降は更新が必要(#[case] offset_secs: i64, #[case] expected: bool) {
      let expires_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
      let now = expires_at + Duration::seconds(offset_secs);

      assert_eq!(integration(expires_at).needs_refresh(now), expected);
   }

   #[test]
   fn test_with_tokensでトークンだけ差し替わる() {
      let expires_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
      let original = integration(expires_at);
      let new_tokens = OAuthTokens {
         access_token:  "access2".to_string(),
         refresh_token: "refresh2".to_string(),
         expires_at:    expires_at + Duration::hours(6),
      };

      let refreshed = original.clone().with_tokens(new_tokens.clone());

      assert_eq!(refreshed.tokens(), &new_tokens);
      assert_eq!(refreshed.id(), original.id());
      assert_eq!(refreshed.connected_at(), original.connected_at());
   }

   #[test]
   fn test_トークンはdebug出力でマスクされる() {
      let tokens = OAuthTokens {
         access_token:  "secret-access".to_string(),
         refresh_token: "secret-refresh".to_string(),
         expires_at:    Utc::now(),
      };

      assert!(!format!("{tokens:?}").contains("secret"));
   }

   #[test]
   fn test_同期結果の集計() {
      let mut summary = SyncSummary::default();
      summary.record(true);
      summary.record(false);
      summary.record(true);

      assert_eq!(
         summary,
         SyncSummary {
            synced:  2,
            skipped: 1,
            total:   3,
         }
      );
   }

   #[test]
   fn test_プロバイダは小文字で文字列化される() {
      assert_eq!(Provider::Strava.to_string(), "strava");
      assert_eq!("strava".parse::<Provider>().unwrap(), Provider::Strava);
   }
}
