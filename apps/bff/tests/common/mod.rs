//! 結合テスト共通のアプリ構築ヘルパー
//!
//! 本番と同じ `build_app` に、インメモリリポジトリと
//! ID プロバイダ・LLM のスタブを渡してルーターを組み立てる。

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, body::Body};
use chrono::{TimeZone, Utc};
use fitplan_bff::{
   app_builder::{AppDeps, Repositories, build_app},
   client::{
      ChatRequest,
      IdentityClient,
      IdentityError,
      LlmClient,
      LlmError,
      Principal,
      StravaClientImpl,
   },
   config::BffConfig,
};
use fitplan_domain::{
   clock::FixedClock,
   meal::MealType,
   user::{Email, UserId},
};
use fitplan_infra::mock::{
   MockDietaryPreferenceRepository,
   MockGoalRepository,
   MockIntegrationRepository,
   MockMealRepository,
   MockProfileRepository,
   MockScheduleGenerationRepository,
   MockTrackingRepository,
   MockTransactionManager,
   MockWorkoutRepository,
};
use http::{Request, header};
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;

pub const VALID_TOKEN: &str = "valid-token";

/// 固定トークンだけを受け入れる ID プロバイダ
pub struct StubIdentity {
   pub user_id: UserId,
}

#[async_trait]
impl IdentityClient for StubIdentity {
   async fn verify(&self, token: &str) -> Result<Principal, IdentityError> {
      if token != VALID_TOKEN {
         return Err(IdentityError::Rejected(401));
      }
      Ok(Principal {
         user_id: self.user_id.clone(),
         email:   Email::new("runner@example.com").unwrap(),
         token:   token.to_string(),
      })
   }

   async fn is_healthy(&self) -> bool {
      true
   }
}

/// システムプロンプトに応じて定型の JSON を返す LLM
#[derive(Default)]
pub struct ScriptedLlm {
   calls: Mutex<usize>,
}

impl ScriptedLlm {
   pub fn calls(&self) -> usize {
      *self.calls.lock().unwrap()
   }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
   async fn complete_json(&self, request: ChatRequest) -> Result<String, LlmError> {
      *self.calls.lock().unwrap() += 1;
      let reply = if request.system.contains("workout planner") {
         json!({
            "title": "Full Body Strength",
            "description": "Compound lifts",
            "workout_type": "strength",
            "duration_minutes": 45,
            "intensity": "medium",
            "calories_burned": 320,
            "exercises": [{"name": "Squat", "sets": 3, "reps": "10"}]
         })
      } else if request.system.contains("nutritionist") {
         let meal_type = MealType::ALL
            .into_iter()
            .find(|t| {
               request
                  .user
                  .starts_with(&format!("Generate a personalized {t} "))
            })
            .unwrap_or(MealType::Lunch);
         meal_reply(meal_type)
      } else {
         json!({})
      };
      Ok(reply.to_string())
   }
}

/// 区分ごとの食事（合計 2000 kcal）
fn meal_reply(meal_type: MealType) -> Value {
   let (title, calories, protein) = match meal_type {
      MealType::Breakfast => ("Greek Yogurt Bowl", 450, 30.0),
      MealType::Lunch => ("Chicken Rice Bowl", 650, 45.0),
      MealType::Dinner => ("Salmon with Quinoa", 700, 48.0),
      MealType::Snack => ("Apple and Almonds", 200, 5.0),
   };
   json!({
      "title": title,
      "description": format!("A balanced {meal_type}"),
      "meal_type": meal_type,
      "calories": calories,
      "protein_g": protein,
      "carbs_g": 40.0,
      "fat_g": 10.0,
      "ingredients": [{"name": "Base", "amount": 1, "unit": "cup"}],
      "instructions": ["Prepare", "Serve"]
   })
}

/// テスト用アプリ
pub struct TestApp {
   pub router:    Router,
   pub user_id:   UserId,
   pub workouts:  MockWorkoutRepository,
   pub meals:     MockMealRepository,
   pub schedules: MockScheduleGenerationRepository,
   pub llm:       Arc<ScriptedLlm>,
}

pub fn test_config() -> BffConfig {
   BffConfig::from_lookup(|name| {
      let value = match name {
         "DATABASE_URL" => "postgres://localhost/fitplan_test",
         "SUPABASE_URL" => "http://127.0.0.1:9",
         "SUPABASE_ANON_KEY" => "anon-key",
         "OPENAI_API_KEY" => "sk-test",
         "STRAVA_API_URL" => "http://127.0.0.1:9",
         "STRAVA_CLIENT_ID" => "12345",
         _ => return None,
      };
      Some(value.to_string())
   })
   .unwrap()
}

/// モック依存でアプリを構築する（tokio ランタイム内で呼ぶ）
pub fn test_app() -> TestApp {
   let config = test_config();
   let user_id = UserId::new();
   let workouts = MockWorkoutRepository::new();
   let meals = MockMealRepository::new();
   let schedules = MockScheduleGenerationRepository::new();
   let llm = Arc::new(ScriptedLlm::default());

   let deps = AppDeps {
      pool:         PgPoolOptions::new()
         .connect_lazy(&config.database_url)
         .unwrap(),
      identity:     Arc::new(StubIdentity {
         user_id: user_id.clone(),
      }),
      llm:          llm.clone(),
      strava:       Arc::new(
         StravaClientImpl::new(config.strava.clone(), config.http_timeout).unwrap(),
      ),
      repositories: Repositories {
         profiles:     Arc::new(MockProfileRepository::new()),
         goals:        Arc::new(MockGoalRepository::new()),
         dietary:      Arc::new(MockDietaryPreferenceRepository::new()),
         workouts:     Arc::new(workouts.clone()),
         meals:        Arc::new(meals.clone()),
         tracking:     Arc::new(MockTrackingRepository::new()),
         integrations: Arc::new(MockIntegrationRepository::new()),
         schedules:    Arc::new(schedules.clone()),
      },
      tx_manager:   Arc::new(MockTransactionManager::new()),
      clock:        Arc::new(FixedClock::new(
         Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap(),
      )),
   };

   TestApp {
      router: build_app(&config, deps),
      user_id,
      workouts,
      meals,
      schedules,
      llm,
   }
}

/// 認証ヘッダー付きのリクエスト
pub fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
   let builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::AUTHORIZATION, format!("Bearer {VALID_TOKEN}"));
   match body {
      Some(body) => builder
         .header(header::CONTENT_TYPE, "application/json")
         .body(Body::from(body.to_string()))
         .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
   }
}

/// レスポンスボディを JSON として読む
pub async fn body_json(response: axum::response::Response) -> Value {
   let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
   serde_json::from_slice(&bytes).unwrap()
}
