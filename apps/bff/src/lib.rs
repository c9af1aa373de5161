//! # BFF (Backend for Frontend) ライブラリ
//!
//! フロントエンド専用の API サーバーのコアモジュール。
//!
//! ## モジュール構成
//!
//! - `app_builder`: 依存の組み立てとルーター構築
//! - `client`: 外部 API クライアント（ID プロバイダ・LLM・Strava）
//! - `config`: 環境変数からの設定読み込み
//! - `error`: BFF 共通エラーとリクエスト抽出子
//! - `handler`: HTTP ハンドラ
//! - `middleware`: ミドルウェア（認証・Request ID）
//! - `openapi`: OpenAPI 仕様
//! - `usecase`: ユースケース

pub mod app_builder;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod openapi;
pub mod usecase;
