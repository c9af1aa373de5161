//! # 認証ミドルウェア
//!
//! `Authorization: Bearer <token>` を ID プロバイダで検証し、
//! [`Principal`] をリクエストの extensions に格納する。
//!
//! ヘッダーの欠落・形式不正・トークン拒否・ID プロバイダ到達不能は
//! 区別せず、すべて 401 にする。
//!
//! ## 使い方
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! Router::new()
//!     .route("/api/workouts", get(list_workouts))
//!     .layer(from_fn_with_state(identity_client, require_auth))
//! ```
//!
//! ハンドラでは `Extension(principal): Extension<Principal>` で受け取る。

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use fitplan_shared::event_log::error::{category, kind};

use crate::{
   client::{IdentityClient, IdentityError},
   error::BffError,
};

/// 認証ミドルウェア
pub async fn require_auth(
   State(identity): State<Arc<dyn IdentityClient>>,
   mut request: Request<Body>,
   next: Next,
) -> Result<Response, BffError> {
   let bearer = request
      .headers()
      .typed_get::<Authorization<Bearer>>()
      .ok_or(BffError::Unauthorized)?;

   let principal = match identity.verify(bearer.token()).await {
      Ok(principal) => principal,
      Err(IdentityError::Rejected(status)) => {
         tracing::info!(status, "トークンが拒否されました");
         return Err(BffError::Unauthorized);
      }
      Err(e) => {
         tracing::warn!(
            error.category = category::EXTERNAL_SERVICE,
            error.kind = kind::IDENTITY,
            "トークンを検証できません: {}",
            e
         );
         return Err(BffError::Unauthorized);
      }
   };

   tracing::Span::current().record("user_id", tracing::field::display(&principal.user_id));
   request.extensions_mut().insert(principal);

   Ok(next.run(request).await)
}
