//! # BFF (Backend for Frontend) サーバー
//!
//! フィットネス・栄養管理アプリのフロントエンド専用 API サーバー。
//!
//! ## 役割
//!
//! - **認証**: Bearer トークンを ID プロバイダで検証し、呼び出し元を特定する
//! - **記録**: プロフィール・ワークアウト・食事・健康記録の CRUD
//! - **生成**: LLM によるワークアウト・献立の生成とスケジュール化
//! - **連携**: Strava とのアクティビティ同期
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Frontend   │────▶│     BFF      │────▶│  PostgreSQL  │
//! └──────────────┘     │  port: 8000  │     └──────────────┘
//!                      └──────────────┘
//!                        │    │     │
//!              ┌─────────┘    │     └─────────┐
//!              ▼              ▼               ▼
//!       ┌────────────┐ ┌────────────┐ ┌────────────┐
//!       │  Supabase  │ │  OpenAI    │ │   Strava   │
//!       │   Auth     │ │  互換 API  │ │    API     │
//!       └────────────┘ └────────────┘ └────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `BFF_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `BFF_PORT` | No | ポート番号（デフォルト: `8000`） |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `SUPABASE_URL` | **Yes** | ID プロバイダの URL |
//! | `SUPABASE_ANON_KEY` | **Yes** | ID プロバイダの API キー |
//! | `OPENAI_API_KEY` | **Yes** | LLM の API キー |
//! | `OPENAI_BASE_URL` / `OPENAI_MODEL` | No | LLM の接続先とモデル |
//! | `STRAVA_CLIENT_ID` / `STRAVA_CLIENT_SECRET` | No | Strava OAuth クライアント |
//! | `ALLOWED_ORIGINS` | No | CORS 許可オリジン（カンマ区切り） |
//! | `HTTP_TIMEOUT_SECS` | No | 外部 API のタイムアウト（秒） |
//! | `RUN_MIGRATIONS` | No | 起動時にマイグレーションを適用するか |
//! | `LOG_FORMAT` | No | `json` で JSON ログ |
//!
//! ## 起動方法
//!
//! ```bash
//! cargo run -p fitplan-bff
//! ```

use std::net::SocketAddr;

use anyhow::Context;
use fitplan_bff::{
   app_builder::{AppDeps, build_app},
   config::BffConfig,
};
use fitplan_infra::db;
use fitplan_shared::observability::TracingConfig;
use tokio::net::TcpListener;

/// BFF サーバーのエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. アプリケーション設定の読み込み
/// 4. DB 接続とマイグレーション
/// 5. ルーターの構築
/// 6. HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
   // .env ファイルを読み込む（存在する場合）
   dotenvy::dotenv().ok();

   let tracing_config = TracingConfig::from_env("bff");
   fitplan_shared::observability::init_tracing(tracing_config);
   let _tracing_guard = tracing::info_span!("app", service = "bff").entered();

   let config = BffConfig::from_env().context("設定の読み込みに失敗しました")?;

   tracing::info!("BFF サーバーを起動します: {}:{}", config.host, config.port);

   let pool = db::create_pool(&config.database_url)
      .await
      .context("データベースへの接続に失敗しました")?;
   if config.run_migrations {
      db::run_migrations(&pool)
         .await
         .context("マイグレーションの適用に失敗しました")?;
      tracing::info!("マイグレーションを適用しました");
   }

   let deps =
      AppDeps::from_config(&config, pool).context("HTTP クライアントの初期化に失敗しました")?;
   let app = build_app(&config, deps);

   let addr: SocketAddr = format!("{}:{}", config.host, config.port)
      .parse()
      .context("アドレスのパースに失敗しました")?;

   let listener = TcpListener::bind(addr).await?;
   tracing::info!("BFF サーバーが起動しました: {}", addr);

   axum::serve(listener, app).await?;

   Ok(())
}
