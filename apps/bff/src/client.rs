//! # 外部 API クライアント
//!
//! ID プロバイダ、LLM、Strava との通信を担当する。
//! いずれもトレイトで抽象化し、ユースケースのテストではスタブに差し替える。

pub mod identity;
pub mod llm;
pub mod strava;

pub use identity::{IdentityClient, IdentityError, Principal, SupabaseIdentityClient};
pub use llm::{ChatRequest, LlmClient, LlmError, OpenAiClient};
pub use strava::{Athlete, StravaClient, StravaClientImpl, StravaError, TokenResponse};
