//! # LLM クライアント
//!
//! OpenAI 互換の Chat Completions API を JSON モードで呼び出す。
//!
//! ## エンドポイント
//!
//! - `POST {base_url}/chat/completions`
//!
//! 生成結果の本文（`choices[0].message.content`）を文字列のまま返し、
//! 型付きスキーマへの変換は呼び出し側で行う。再試行はしない。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// LLM クライアントエラー
#[derive(Debug, Error)]
pub enum LlmError {
   /// ネットワークエラー・タイムアウト
   #[error("LLM API への接続に失敗しました: {0}")]
   Network(#[from] reqwest::Error),

   /// 200 以外のステータス
   #[error("LLM API がエラーを返しました（ステータス {status}）: {body}")]
   Status { status: u16, body: String },

   /// 本文が空
   #[error("LLM API の応答に生成結果がありません")]
   EmptyResponse,
}

/// 1 回の生成リクエスト
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
   pub system:      String,
   pub user:        String,
   pub temperature: f32,
}

/// LLM クライアントトレイト
#[async_trait]
pub trait LlmClient: Send + Sync {
   /// JSON オブジェクトを返すよう指示して生成し、本文を返す
   async fn complete_json(&self, request: ChatRequest) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct Message<'a> {
   role:    &'static str,
   content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
   #[serde(rename = "type")]
   format_type: &'static str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
   model:           &'a str,
   messages:        [Message<'a>; 2],
   response_format: ResponseFormat,
   temperature:     f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
   #[serde(default)]
   choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
   message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
   content: Option<String>,
}

/// OpenAI Chat Completions クライアント実装
pub struct OpenAiClient {
   base_url: String,
   api_key:  String,
   model:    String,
   client:   reqwest::Client,
}

impl OpenAiClient {
   pub fn new(
      base_url: &str,
      api_key: &str,
      model: &str,
      timeout: Duration,
   ) -> Result<Self, reqwest::Error> {
      Ok(Self {
         base_url: base_url.trim_end_matches('/').to_string(),
         api_key:  api_key.to_string(),
         model:    model.to_string(),
         client:   reqwest::Client::builder().timeout(timeout).build()?,
      })
   }
}

#[async_trait]
impl LlmClient for OpenAiClient {
   #[tracing::instrument(skip_all, level = "debug", fields(model = %self.model))]
   async fn complete_json(&self, request: ChatRequest) -> Result<String, LlmError> {
      let url = format!("{}/chat/completions", self.base_url);
      let body = CompletionRequest {
         model:           &self.model,
         messages:        [
            Message {
               role:    "system",
               content: &request.system,
            },
            Message {
               role:    "user",
               content: &request.user,
            },
         ],
         response_format: ResponseFormat {
            format_type: "json_object",
         },
         temperature:     request.temperature,
      };

      let response = self
         .client
         .post(&url)
         .bearer_auth(&self.api_key)
         .json(&body)
         .send()
         .await?;

      let status = response.status();
      if !status.is_success() {
         let body = response.text().await.unwrap_or_default();
         return Err(LlmError::Status {
            status: status.as_u16(),
            body,
         });
      }

      let completion = response.json::<CompletionResponse>().await?;
      completion
         .choices
         .into_iter()
         .next()
         .and_then(|c| c.message.content)
         .filter(|c| !c.trim().is_empty())
         .ok_or(LlmError::EmptyResponse)
   }
}

#[cfg(test)]
mod tests {
   use mockito::Matcher;
   use pretty_assertions::assert_eq;
   use serde_json::json;

   use super::*;

   fn client(server: &mockito::Server) -> OpenAiClient {
      OpenAiClient::new(&server.url(), "sk-test", "gpt-4o", Duration::from_secs(5)).unwrap()
   }

   fn request() -> ChatRequest {
      ChatRequest {
         system:      "You are a trainer.".to_string(),
         user:        "Generate a workout".to_string(),
         temperature: 0.7,
      }
   }

   #[tokio::test]
   async fn test_complete_json_jsonモードでリクエストし本文を返す() {
      let mut server = mockito::Server::new_async().await;
      let mock = server
         .mock("POST", "/chat/completions")
         .match_header("authorization", "Bearer sk-test")
         .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o",
            "messages": [
               {"role": "system", "content": "You are a trainer."},
               {"role": "user", "content": "Generate a workout"}
            ],
            "response_format": {"type": "json_object"},
            "temperature": 0.7
         })))
         .with_status(200)
         .with_header("content-type", "application/json")
         .with_body(
            json!({
               "id": "chatcmpl-1",
               "choices": [
                  {"index": 0, "message": {"role": "assistant", "content": "{\"title\":\"Run\"}"}}
               ]
            })
            .to_string(),
         )
         .expect(1)
         .create_async()
         .await;

      let content = client(&server).complete_json(request()).await.unwrap();

      assert_eq!(content, r#"{"title":"Run"}"#);
      mock.assert_async().await;
   }

   #[tokio::test]
   async fn test_complete_json_エラーステータスはstatusエラー() {
      let mut server = mockito::Server::new_async().await;
      server
         .mock("POST", "/chat/completions")
         .with_status(429)
         .with_body("rate limited")
         .create_async()
         .await;

      let err = client(&server).complete_json(request()).await.unwrap_err();

      match err {
         LlmError::Status { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
         }
         other => panic!("Status を期待したが {:?} を受信", other),
      }
   }

   #[tokio::test]
   async fn test_complete_json_choicesが空ならempty_response() {
      let mut server = mockito::Server::new_async().await;
      server
         .mock("POST", "/chat/completions")
         .with_status(200)
         .with_body(r#"{"choices":[]}"#)
         .create_async()
         .await;

      let err = client(&server).complete_json(request()).await.unwrap_err();

      assert!(matches!(err, LlmError::EmptyResponse));
   }
}
