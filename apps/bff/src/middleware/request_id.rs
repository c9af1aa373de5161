//! # Request ID の保持と転送
//!
//! `SetRequestIdLayer` が採番した Request ID をリクエスト処理中のタスクに保持し、
//! ID プロバイダへの問い合わせに `X-Request-Id` として付与する。
//! 認証ミドルウェアはハンドラより先に外部呼び出しを行うため、
//! 引数ではなく task-local で受け渡す。

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use fitplan_shared::observability::REQUEST_ID_HEADER;
use tower_http::request_id::RequestId;

tokio::task_local! {
   static REQUEST_ID: String;
}

/// 処理中リクエストの Request ID（スコープ外なら `None`）
pub fn current_request_id() -> Option<String> {
   REQUEST_ID.try_with(Clone::clone).ok()
}

/// extensions の [`RequestId`] を task-local に載せて後続を実行する
pub async fn store_request_id(request: Request<Body>, next: Next) -> Response {
   let request_id = request
      .extensions()
      .get::<RequestId>()
      .and_then(|id| id.header_value().to_str().ok())
      .unwrap_or("-")
      .to_owned();

   REQUEST_ID.scope(request_id, next.run(request)).await
}

/// 外部呼び出しに Request ID ヘッダーを付与する
pub fn inject_request_id(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
   match current_request_id() {
      Some(id) => builder.header(REQUEST_ID_HEADER, id),
      None => builder,
   }
}
