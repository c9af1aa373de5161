//! # ID プロバイダクライアント
//!
//! Supabase Auth にアクセストークンを問い合わせ、呼び出し元のユーザーを確定する。
//!
//! ## エンドポイント
//!
//! - `GET /auth/v1/user` - トークンの検証とユーザー情報の取得
//! - `GET /auth/v1/health` - readiness チェック

use std::time::Duration;

use async_trait::async_trait;
use fitplan_domain::user::{Email, UserId};
use serde::Deserialize;
use thiserror::Error;

use crate::middleware::request_id::inject_request_id;

/// ID プロバイダクライアントエラー
///
/// 呼び出し側ではすべて 401 に畳み込むため、種別は記録用にのみ使う。
#[derive(Debug, Error)]
pub enum IdentityError {
   /// トークンが拒否された（200 以外）
   #[error("トークンが拒否されました（ステータス {0}）")]
   Rejected(u16),

   /// ネットワークエラー
   #[error("ネットワークエラー: {0}")]
   Network(#[from] reqwest::Error),

   /// レスポンスを解釈できない
   #[error("ユーザー情報を解釈できません: {0}")]
   InvalidResponse(String),
}

/// 認証済みの呼び出し元
#[derive(Debug, Clone)]
pub struct Principal {
   pub user_id: UserId,
   pub email:   Email,
   /// 検証済みのアクセストークン
   pub token:   String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
   id:    String,
   email: Option<String>,
}

/// ID プロバイダクライアントトレイト
#[async_trait]
pub trait IdentityClient: Send + Sync {
   /// アクセストークンを検証し、呼び出し元を返す
   async fn verify(&self, token: &str) -> Result<Principal, IdentityError>;

   /// ID プロバイダが応答するか
   async fn is_healthy(&self) -> bool;
}

/// Supabase Auth クライアント実装
pub struct SupabaseIdentityClient {
   base_url: String,
   anon_key: String,
   client:   reqwest::Client,
}

impl SupabaseIdentityClient {
   pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
      Ok(Self {
         base_url: base_url.trim_end_matches('/').to_string(),
         anon_key: anon_key.to_string(),
         client:   reqwest::Client::builder().timeout(timeout).build()?,
      })
   }
}

#[async_trait]
impl IdentityClient for SupabaseIdentityClient {
   async fn verify(&self, token: &str) -> Result<Principal, IdentityError> {
      let url = format!("{}/auth/v1/user", self.base_url);
      let request = self
         .client
         .get(&url)
         .bearer_auth(token)
         .header("apikey", &self.anon_key);

      let response = inject_request_id(request).send().await?;
      let status = response.status();
      if status != reqwest::StatusCode::OK {
         return Err(IdentityError::Rejected(status.as_u16()));
      }

      let body = response
         .json::<UserResponse>()
         .await
         .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;
      let user_id = body
         .id
         .parse::<UserId>()
         .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;
      let email = body
         .email
         .ok_or_else(|| IdentityError::InvalidResponse("email がありません".to_string()))
         .and_then(|e| {
            Email::new(e).map_err(|e| IdentityError::InvalidResponse(e.to_string()))
         })?;

      Ok(Principal {
         user_id,
         email,
         token: token.to_string(),
      })
   }

   async fn is_healthy(&self) -> bool {
      let url = format!("{}/auth/v1/health", self.base_url);
      let request = self.client.get(&url).header("apikey", &self.anon_key);
      match inject_request_id(request).send().await {
         Ok(response) => response.status().is_success(),
         Err(e) => {
            tracing::warn!(error = %e, "ID プロバイダのヘルスチェックに失敗");
            false
         }
      }
   }
}
