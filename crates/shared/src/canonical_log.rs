//! # Canonical Log Line ミドルウェア
//!
//! HTTP リクエスト完了時に、メソッド・パス・API グループ・ステータス・レイテンシを
//! 1 行に集約したサマリログを出力する tower Layer。
//!
//! TraceLayer のスパン内に配置するため、スパンフィールド（request_id, user_id）が
//! JSON ログに自動的に含まれる。
//!
//! ```text
//! TraceLayer → CanonicalLogLineLayer → CorsLayer → [認証ミドルウェア] → handler
//! ```
//!
//! LLM を呼ぶ生成系 API は数秒〜数十秒かかるため、閾値を超えたリクエストは
//! `http.slow = true` を付けて WARN で出力する。

use std::{
   future::Future,
   pin::Pin,
   task::{Context, Poll},
   time::{Duration, Instant},
};

use http::{Method, Request, Response};
use tower::{Layer, Service};

/// 低速リクエストとみなす既定の閾値
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_secs(10);

/// サマリログを出さないリクエスト
///
/// ヘルスチェック（`/health`, `/health/ready`）と CORS プリフライト。
fn is_skipped(method: &Method, path: &str) -> bool {
   *method == Method::OPTIONS || path.starts_with("/health")
}

/// パスから API グループ名を取り出す
///
/// `/api/ai/meals/generate` → `ai-meals`、`/api/strava/sync` → `strava`。
/// `/api` 配下でなければ `other`。
fn api_group(path: &str) -> String {
   let mut segments = path.trim_start_matches('/').split('/');
   if segments.next() != Some("api") {
      return "other".to_string();
   }
   match (segments.next(), segments.next()) {
      (Some("ai"), Some(kind)) if !kind.is_empty() => format!("ai-{kind}"),
      (Some(group), _) if !group.is_empty() => group.to_string(),
      _ => "other".to_string(),
   }
}

/// Canonical Log Line を出力する Layer
///
/// リクエスト完了時に `log.type = "canonical"` マーカー付きのサマリログを出力する。
/// 5xx と低速リクエストは WARN、それ以外は INFO。
#[derive(Clone, Debug)]
pub struct CanonicalLogLineLayer {
   slow_threshold: Duration,
}

impl CanonicalLogLineLayer {
   pub fn new(slow_threshold: Duration) -> Self {
      Self { slow_threshold }
   }
}

impl Default for CanonicalLogLineLayer {
   fn default() -> Self {
      Self::new(DEFAULT_SLOW_THRESHOLD)
   }
}

impl<S> Layer<S> for CanonicalLogLineLayer {
   type Service = CanonicalLogLineService<S>;

   fn layer(&self, inner: S) -> Self::Service {
      CanonicalLogLineService {
         inner,
         slow_threshold: self.slow_threshold,
      }
   }
}

/// [`CanonicalLogLineLayer`] が生成する Service
#[derive(Clone, Debug)]
pub struct CanonicalLogLineService<S> {
   inner:          S,
   slow_threshold: Duration,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CanonicalLogLineService<S>
where
   S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
   S::Future: Send + 'static,
   S::Error: std::fmt::Display + 'static,
   ReqBody: Send + 'static,
   ResBody: Send + 'static,
{
   type Error = S::Error;
   type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
   type Response = S::Response;

   fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
      self.inner.poll_ready(cx)
   }

   fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
      // poll_ready 済みの inner を使う
      let clone = self.inner.clone();
      let mut inner = std::mem::replace(&mut self.inner, clone);

      if is_skipped(req.method(), req.uri().path()) {
         return Box::pin(async move { inner.call(req).await });
      }

      let method = req.method().to_string();
      let path = req.uri().path().to_owned();
      let group = api_group(&path);
      let slow_threshold = self.slow_threshold;
      let start = Instant::now();

      Box::pin(async move {
         let result = inner.call(req).await;
         let elapsed = start.elapsed();
         let latency_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
         let slow = elapsed >= slow_threshold;

         match &result {
            Ok(response) if response.status().is_server_error() || slow => {
               tracing::warn!(
                  log.r#type = "canonical",
                  http.method = %method,
                  http.path = %path,
                  http.group = %group,
                  http.status_code = response.status().as_u16(),
                  http.latency_ms = latency_ms,
                  http.slow = slow,
                  "リクエスト完了"
               );
            }
            Ok(response) => {
               tracing::info!(
                  log.r#type = "canonical",
                  http.method = %method,
                  http.path = %path,
                  http.group = %group,
                  http.status_code = response.status().as_u16(),
                  http.latency_ms = latency_ms,
                  "リクエスト完了"
               );
            }
            Err(err) => {
               tracing::error!(
                  log.r#type = "canonical",
                  http.method = %method,
                  http.path = %path,
                  http.group = %group,
                  http.latency_ms = latency_ms,
                  error.message = %err,
                  "リクエスト処理エラー"
               );
            }
         }

         result
      })
   }
}
