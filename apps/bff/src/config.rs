//! # BFF 設定
//!
//! 環境変数から BFF サーバーの設定を読み込む。
//! `main` で一度だけ読み込み、各クライアントとユースケースには構築時に渡す。

use std::{env, time::Duration};

use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_STRAVA_OAUTH_URL: &str = "https://www.strava.com/oauth";
const DEFAULT_STRAVA_API_URL: &str = "https://www.strava.com/api/v3";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
   #[error("{0} が設定されていません")]
   Missing(&'static str),

   #[error("{name} の値が不正です: {value}")]
   Invalid { name: &'static str, value: String },
}

/// LLM（OpenAI 互換 API）の設定
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
   pub api_key:  String,
   pub base_url: String,
   pub model:    String,
}

/// ID プロバイダ（Supabase Auth）の設定
#[derive(Debug, Clone)]
pub struct IdentityConfig {
   pub url:      String,
   pub anon_key: String,
}

/// Strava API の設定
#[derive(Debug, Clone)]
pub struct StravaConfig {
   pub client_id:     String,
   pub client_secret: String,
   /// OAuth エンドポイントのベース URL（`/authorize`, `/token` を付与する）
   pub oauth_url:     String,
   pub api_url:       String,
}

/// BFF サーバーの設定
#[derive(Debug, Clone)]
pub struct BffConfig {
   /// バインドアドレス
   pub host:            String,
   /// ポート番号
   pub port:            u16,
   pub database_url:    String,
   pub identity:        IdentityConfig,
   pub openai:          OpenAiConfig,
   pub strava:          StravaConfig,
   /// CORS で許可するオリジン
   pub allowed_origins: Vec<String>,
   /// 外部 HTTP 呼び出しのタイムアウト
   pub http_timeout:    Duration,
   /// 起動時にマイグレーションを適用するか
   pub run_migrations:  bool,
}

impl BffConfig {
   /// 環境変数から設定を読み込む
   pub fn from_env() -> Result<Self, ConfigError> {
      Self::from_lookup(|name| env::var(name).ok())
   }

   /// 任意の参照関数から設定を読み込む
   ///
   /// テストではプロセスの環境変数を書き換えずに検証する。
   pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
   where
      F: Fn(&str) -> Option<String>,
   {
      let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
      let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

      let port = match get("BFF_PORT") {
         Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            name:  "BFF_PORT",
            value: v,
         })?,
         None => 8000,
      };
      let http_timeout_secs = match get("HTTP_TIMEOUT_SECS") {
         Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            name:  "HTTP_TIMEOUT_SECS",
            value: v,
         })?,
         None => DEFAULT_HTTP_TIMEOUT_SECS,
      };
      let run_migrations = match get("RUN_MIGRATIONS") {
         Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid {
            name:  "RUN_MIGRATIONS",
            value: v,
         })?,
         None => true,
      };

      Ok(Self {
         host: get("BFF_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
         port,
         database_url: required("DATABASE_URL")?,
         identity: IdentityConfig {
            url:      trim_slash(required("SUPABASE_URL")?),
            anon_key: required("SUPABASE_ANON_KEY")?,
         },
         openai: OpenAiConfig {
            api_key:  required("OPENAI_API_KEY")?,
            base_url: trim_slash(
               get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            ),
            model:    get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
         },
         strava: StravaConfig {
            client_id:     get("STRAVA_CLIENT_ID").unwrap_or_default(),
            client_secret: get("STRAVA_CLIENT_SECRET").unwrap_or_default(),
            oauth_url:     trim_slash(
               get("STRAVA_OAUTH_URL").unwrap_or_else(|| DEFAULT_STRAVA_OAUTH_URL.to_string()),
            ),
            api_url:       trim_slash(
               get("STRAVA_API_URL").unwrap_or_else(|| DEFAULT_STRAVA_API_URL.to_string()),
            ),
         },
         allowed_origins: parse_origins(
            &get("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
         ),
         http_timeout: Duration::from_secs(http_timeout_secs),
         run_migrations,
      })
   }
}

fn trim_slash(url: String) -> String {
   url.trim_end_matches('/').to_string()
}

fn parse_origins(raw: &str) -> Vec<String> {
   raw.split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(ToString::to_string)
      .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
   match raw.trim().to_ascii_lowercase().as_str() {
      "true" | "1" | "yes" => Some(true),
      "false" | "0" | "no" => Some(false),
      _ => None,
   }
}
