//! # Strava クライアント
//!
//! Strava の OAuth と REST API（v3）への通信を担当する。
//!
//! ## エンドポイント
//!
//! - `GET {oauth}/authorize` - 認可画面（URL の組み立てのみ）
//! - `POST {oauth}/token` - 認可コード交換・トークン更新（フォーム POST）
//! - `GET /athlete`, `GET /athletes/{id}/stats`
//! - `GET /athlete/activities`
//! - `POST /activities`

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fitplan_domain::{
   activity::{NewStravaActivity, StravaActivity},
   integration::{IntegrationMetadata, OAuthTokens},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::StravaConfig;

/// 認可時に要求するスコープ
pub const OAUTH_SCOPE: &str = "read,activity:read_all,activity:write";

/// Strava クライアントエラー
#[derive(Debug, Error)]
pub enum StravaError {
   /// ネットワークエラー・タイムアウト・本文の解釈失敗
   #[error("Strava API との通信に失敗しました: {0}")]
   Network(#[from] reqwest::Error),

   /// 想定外のステータス
   #[error("Strava API がエラーを返しました（ステータス {status}）: {body}")]
   Status { status: u16, body: String },

   /// 設定値から URL を組み立てられない
   #[error("Strava の URL が不正です: {0}")]
   InvalidUrl(#[from] url::ParseError),

   /// トークンの有効期限を解釈できない
   #[error("トークンの有効期限が不正です: {0}")]
   InvalidExpiry(i64),
}

/// アスリート（認証ユーザー）
///
/// 統計 API の呼び出しに `id` を使い、残りのフィールドはそのまま返す。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
   pub id:        i64,
   #[serde(default)]
   pub firstname: Option<String>,
   #[serde(default)]
   pub lastname:  Option<String>,
   #[serde(flatten)]
   pub extra:     serde_json::Map<String, serde_json::Value>,
}

impl Athlete {
   /// 表示名（`firstname lastname`）
   pub fn display_name(&self) -> String {
      [self.firstname.as_deref(), self.lastname.as_deref()]
         .into_iter()
         .flatten()
         .filter(|s| !s.is_empty())
         .collect::<Vec<_>>()
         .join(" ")
   }
}

/// トークンエンドポイントの応答
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
   pub access_token:  String,
   pub refresh_token: String,
   /// 有効期限（UNIX 秒）
   pub expires_at:    i64,
   /// 認可コード交換時のみ返る
   #[serde(default)]
   pub athlete:       Option<Athlete>,
}

impl TokenResponse {
   pub fn tokens(&self) -> Result<OAuthTokens, StravaError> {
      let expires_at = DateTime::<Utc>::from_timestamp(self.expires_at, 0)
         .ok_or(StravaError::InvalidExpiry(self.expires_at))?;
      Ok(OAuthTokens {
         access_token: self.access_token.clone(),
         refresh_token: self.refresh_token.clone(),
         expires_at,
      })
   }

   pub fn metadata(&self) -> IntegrationMetadata {
      IntegrationMetadata {
         athlete_id:   self.athlete.as_ref().map(|a| a.id),
         athlete_name: self.athlete.as_ref().map(Athlete::display_name),
      }
   }
}

/// Strava クライアントトレイト
#[async_trait]
pub trait StravaClient: Send + Sync {
   /// 認可画面の URL を組み立てる
   fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<Url, StravaError>;

   /// 認可コードをトークンに交換する
   async fn exchange_code(&self, code: &str) -> Result<TokenResponse, StravaError>;

   /// リフレッシュトークンでトークンを更新する
   async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, StravaError>;

   async fn get_athlete(&self, access_token: &str) -> Result<Athlete, StravaError>;

   async fn get_athlete_stats(
      &self,
      access_token: &str,
      athlete_id: i64,
   ) -> Result<serde_json::Value, StravaError>;

   /// `after` 以降に開始したアクティビティを取得する
   async fn list_activities(
      &self,
      access_token: &str,
      after: DateTime<Utc>,
      per_page: u32,
   ) -> Result<Vec<StravaActivity>, StravaError>;

   /// アクティビティを登録する（200 / 201 を成功とみなす）
   async fn create_activity(
      &self,
      access_token: &str,
      activity: &NewStravaActivity,
   ) -> Result<serde_json::Value, StravaError>;
}

/// Strava クライアント実装
pub struct StravaClientImpl {
   config: StravaConfig,
   client: reqwest::Client,
}

impl StravaClientImpl {
   pub fn new(config: StravaConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
      Ok(Self {
         config,
         client: reqwest::Client::builder().timeout(timeout).build()?,
      })
   }

   async fn post_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, StravaError> {
      let url = format!("{}/token", self.config.oauth_url);
      let response = self.client.post(&url).form(form).send().await?;
      parse_json(response, &[reqwest::StatusCode::OK]).await
   }
}

/// 許可したステータスなら JSON として読み、それ以外は `Status` エラーにする
async fn parse_json<T: serde::de::DeserializeOwned>(
   response: reqwest::Response,
   accepted: &[reqwest::StatusCode],
) -> Result<T, StravaError> {
   let status = response.status();
   if !accepted.contains(&status) {
      let body = response.text().await.unwrap_or_default();
      return Err(StravaError::Status {
         status: status.as_u16(),
         body,
      });
   }
   Ok(response.json::<T>().await?)
}

#[async_trait]
impl StravaClient for StravaClientImpl {
   fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<Url, StravaError> {
      let url = Url::parse_with_params(
         &format!("{}/authorize", self.config.oauth_url),
         &[
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", OAUTH_SCOPE),
            ("state", state),
         ],
      )?;
      Ok(url)
   }

   #[tracing::instrument(skip_all, level = "debug")]
   async fn exchange_code(&self, code: &str) -> Result<TokenResponse, StravaError> {
      self.post_token(&[
         ("client_id", &self.config.client_id),
         ("client_secret", &self.config.client_secret),
         ("code", code),
         ("grant_type", "authorization_code"),
      ])
      .await
   }

   #[tracing::instrument(skip_all, level = "debug")]
   async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, StravaError> {
      self.post_token(&[
         ("client_id", &self.config.client_id),
         ("client_secret", &self.config.client_secret),
         ("refresh_token", refresh_token),
         ("grant_type", "refresh_token"),
      ])
      .await
   }

   #[tracing::instrument(skip_all, level = "debug")]
   async fn get_athlete(&self, access_token: &str) -> Result<Athlete, StravaError> {
      let url = format!("{}/athlete", self.config.api_url);
      let response = self.client.get(&url).bearer_auth(access_token).send().await?;
      parse_json(response, &[reqwest::StatusCode::OK]).await
   }

   #[tracing::instrument(skip_all, level = "debug", fields(athlete_id))]
   async fn get_athlete_stats(
      &self,
      access_token: &str,
      athlete_id: i64,
   ) -> Result<serde_json::Value, StravaError> {
      let url = format!("{}/athletes/{athlete_id}/stats", self.config.api_url);
      let response = self.client.get(&url).bearer_auth(access_token).send().await?;
      parse_json(response, &[reqwest::StatusCode::OK]).await
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%after, per_page))]
   async fn list_activities(
      &self,
      access_token: &str,
      after: DateTime<Utc>,
      per_page: u32,
   ) -> Result<Vec<StravaActivity>, StravaError> {
      let url = format!("{}/athlete/activities", self.config.api_url);
      let response = self
         .client
         .get(&url)
         .bearer_auth(access_token)
         .query(&[
            ("per_page", per_page.to_string()),
            ("after", after.timestamp().to_string()),
         ])
         .send()
         .await?;
      parse_json(response, &[reqwest::StatusCode::OK]).await
   }

   #[tracing::instrument(skip_all, level = "debug")]
   async fn create_activity(
      &self,
      access_token: &str,
      activity: &NewStravaActivity,
   ) -> Result<serde_json::Value, StravaError> {
      let url = format!("{}/activities", self.config.api_url);
      let response = self
         .client
         .post(&url)
         .bearer_auth(access_token)
         .json(activity)
         .send()
         .await?;
      parse_json(
         response,
         &[reqwest::StatusCode::OK, reqwest::StatusCode::CREATED],
      )
      .await
   }
}
