//! # BFF アプリケーション構築
//!
//! DI（クライアント・リポジトリ・ユースケース・State）の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。
//!
//! 外部依存はすべて [`AppDeps`] で受け取るため、結合テストではスタブと
//! インメモリリポジトリを渡して同じルーターを組み立てられる。

use std::sync::Arc;

use axum::{
   Router,
   http::HeaderValue,
   middleware::{from_fn, from_fn_with_state},
   routing::{delete, get, patch, post},
};
use fitplan_domain::clock::{Clock, SystemClock};
use fitplan_infra::{
   db::{PgTransactionManager, TransactionManager},
   repository::{
      DietaryPreferenceRepository,
      GoalRepository,
      IntegrationRepository,
      MealRepository,
      PostgresDietaryPreferenceRepository,
      PostgresGoalRepository,
      PostgresIntegrationRepository,
      PostgresMealRepository,
      PostgresProfileRepository,
      PostgresScheduleGenerationRepository,
      PostgresTrackingRepository,
      PostgresWorkoutRepository,
      ProfileRepository,
      ScheduleGenerationRepository,
      TrackingRepository,
      WorkoutRepository,
   },
};
use fitplan_shared::{
   canonical_log::CanonicalLogLineLayer,
   observability::{MakeRequestUuidV7, make_request_span},
};
use sqlx::PgPool;
use tower_http::{
   cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
   request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
   trace::TraceLayer,
};

use crate::{
   client::{
      IdentityClient,
      LlmClient,
      OpenAiClient,
      StravaClient,
      StravaClientImpl,
      SupabaseIdentityClient,
   },
   config::BffConfig,
   handler::{
      AiMealState,
      AiWorkoutState,
      IntegrationState,
      MealState,
      ProfileState,
      ReadinessState,
      SchedulerState,
      StravaState,
      TrackingState,
      WorkoutState,
      connect_strava,
      create_daily_meal_plan,
      create_daily_schedule,
      create_goal,
      create_meal,
      create_strava_activity,
      create_weekly_meal_plan,
      create_weekly_schedule,
      create_weekly_workout_plan,
      create_workout,
      delete_meal,
      delete_schedule_item,
      delete_workout,
      disconnect_integration,
      disconnect_strava,
      generate_and_save_meal,
      generate_and_save_workout,
      generate_meal,
      generate_workout,
      get_profile,
      get_schedule_range,
      get_strava_activities,
      get_strava_stats,
      health_check,
      list_goals,
      list_integrations,
      list_meals,
      list_sleep,
      list_water,
      list_weight,
      list_workouts,
      readiness_check,
      recommend_exercises,
      record_sleep,
      record_water,
      record_weight,
      strava_callback,
      suggest_recipes,
      sync_strava_activities,
      update_meal,
      update_profile,
      update_schedule_item,
      update_workout,
   },
   middleware::{request_id::store_request_id, require_auth},
   usecase::{
      IntegrationUseCaseImpl,
      MealPlannerUseCaseImpl,
      MealUseCaseImpl,
      ProfileUseCaseImpl,
      SchedulerUseCaseImpl,
      StravaUseCaseImpl,
      TrackingUseCaseImpl,
      UserContextLoader,
      WorkoutGeneratorUseCaseImpl,
      WorkoutUseCaseImpl,
   },
};

/// リポジトリ一式
#[derive(Clone)]
pub struct Repositories {
   pub profiles:     Arc<dyn ProfileRepository>,
   pub goals:        Arc<dyn GoalRepository>,
   pub dietary:      Arc<dyn DietaryPreferenceRepository>,
   pub workouts:     Arc<dyn WorkoutRepository>,
   pub meals:        Arc<dyn MealRepository>,
   pub tracking:     Arc<dyn TrackingRepository>,
   pub integrations: Arc<dyn IntegrationRepository>,
   pub schedules:    Arc<dyn ScheduleGenerationRepository>,
}

impl Repositories {
   /// PostgreSQL 実装で構築する
   pub fn postgres(pool: &PgPool) -> Self {
      Self {
         profiles:     Arc::new(PostgresProfileRepository::new(pool.clone())),
         goals:        Arc::new(PostgresGoalRepository::new(pool.clone())),
         dietary:      Arc::new(PostgresDietaryPreferenceRepository::new(pool.clone())),
         workouts:     Arc::new(PostgresWorkoutRepository::new(pool.clone())),
         meals:        Arc::new(PostgresMealRepository::new(pool.clone())),
         tracking:     Arc::new(PostgresTrackingRepository::new(pool.clone())),
         integrations: Arc::new(PostgresIntegrationRepository::new(pool.clone())),
         schedules:    Arc::new(PostgresScheduleGenerationRepository::new(pool.clone())),
      }
   }
}

/// アプリケーションの外部依存
pub struct AppDeps {
   /// レディネスチェック用
   pub pool:         PgPool,
   pub identity:     Arc<dyn IdentityClient>,
   pub llm:          Arc<dyn LlmClient>,
   pub strava:       Arc<dyn StravaClient>,
   pub repositories: Repositories,
   pub tx_manager:   Arc<dyn TransactionManager>,
   pub clock:        Arc<dyn Clock>,
}

impl AppDeps {
   /// 設定から本番用の依存を構築する
   pub fn from_config(config: &BffConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
      let identity = SupabaseIdentityClient::new(
         &config.identity.url,
         &config.identity.anon_key,
         config.http_timeout,
      )?;
      let llm = OpenAiClient::new(
         &config.openai.base_url,
         &config.openai.api_key,
         &config.openai.model,
         config.http_timeout,
      )?;
      let strava = StravaClientImpl::new(config.strava.clone(), config.http_timeout)?;

      Ok(Self {
         repositories: Repositories::postgres(&pool),
         tx_manager: Arc::new(PgTransactionManager::new(pool.clone())),
         pool,
         identity: Arc::new(identity),
         llm: Arc::new(llm),
         strava: Arc::new(strava),
         clock: Arc::new(SystemClock),
      })
   }
}

/// DI コンテナの構築とルーター定義を行う
///
/// 依存を受け取り、ユースケース → State → Router の順に組み立てる。
pub fn build_app(config: &BffConfig, deps: AppDeps) -> Router {
   let AppDeps {
      pool,
      identity,
      llm,
      strava,
      repositories: repos,
      tx_manager,
      clock,
   } = deps;

   // ユースケースの初期化
   // スケジューラは CRUD と生成のユースケースを共有する
   let context = Arc::new(UserContextLoader::new(
      repos.profiles.clone(),
      repos.goals.clone(),
      repos.dietary.clone(),
   ));
   let workout_usecase = Arc::new(WorkoutUseCaseImpl::new(
      repos.workouts.clone(),
      tx_manager.clone(),
      clock.clone(),
   ));
   let meal_usecase = Arc::new(MealUseCaseImpl::new(
      repos.meals.clone(),
      tx_manager.clone(),
      clock.clone(),
   ));
   let workout_generator = Arc::new(WorkoutGeneratorUseCaseImpl::new(
      context.clone(),
      repos.workouts.clone(),
      llm.clone(),
      tx_manager.clone(),
      clock.clone(),
   ));
   let meal_planner = Arc::new(MealPlannerUseCaseImpl::new(
      context,
      repos.meals.clone(),
      llm,
      tx_manager.clone(),
      clock.clone(),
   ));
   let scheduler = Arc::new(SchedulerUseCaseImpl::new(
      workout_generator.clone(),
      meal_planner.clone(),
      workout_usecase.clone(),
      meal_usecase.clone(),
      repos.workouts.clone(),
      repos.meals.clone(),
      repos.schedules.clone(),
      tx_manager.clone(),
      clock.clone(),
   ));

   let readiness_state = Arc::new(ReadinessState {
      pool,
      identity: identity.clone(),
   });
   let profile_state = Arc::new(ProfileState {
      usecase: Arc::new(ProfileUseCaseImpl::new(
         repos.profiles.clone(),
         repos.goals.clone(),
         tx_manager.clone(),
         clock.clone(),
      )),
   });
   let workout_state = Arc::new(WorkoutState {
      usecase: workout_usecase,
   });
   let meal_state = Arc::new(MealState {
      usecase: meal_usecase,
   });
   let tracking_state = Arc::new(TrackingState {
      usecase: Arc::new(TrackingUseCaseImpl::new(
         repos.tracking.clone(),
         tx_manager.clone(),
         clock.clone(),
      )),
   });
   let ai_workout_state = Arc::new(AiWorkoutState {
      usecase: workout_generator,
   });
   let ai_meal_state = Arc::new(AiMealState {
      usecase: meal_planner,
   });
   let scheduler_state = Arc::new(SchedulerState { usecase: scheduler });
   let integration_state = Arc::new(IntegrationState {
      usecase: Arc::new(IntegrationUseCaseImpl::new(
         repos.integrations.clone(),
         tx_manager.clone(),
      )),
   });
   let strava_state = Arc::new(StravaState {
      usecase: Arc::new(StravaUseCaseImpl::new(
         strava,
         repos.integrations,
         repos.workouts,
         tx_manager,
         clock,
      )),
   });

   // 認証が必要な API
   let api = Router::new()
      // プロフィール API
      .merge(
         Router::new()
            .route("/api/profile/me", get(get_profile).put(update_profile))
            .route("/api/profile/goals", get(list_goals).post(create_goal))
            .with_state(profile_state),
      )
      // ワークアウト API
      .merge(
         Router::new()
            .route("/api/workouts", get(list_workouts).post(create_workout))
            .route(
               "/api/workouts/{id}",
               patch(update_workout).delete(delete_workout),
            )
            .with_state(workout_state),
      )
      // 食事 API
      .merge(
         Router::new()
            .route("/api/meals", get(list_meals).post(create_meal))
            .route("/api/meals/{id}", patch(update_meal).delete(delete_meal))
            .with_state(meal_state),
      )
      // 健康記録 API
      .merge(
         Router::new()
            .route("/api/health/sleep", get(list_sleep).post(record_sleep))
            .route("/api/health/weight", get(list_weight).post(record_weight))
            .route("/api/health/water", get(list_water).post(record_water))
            .with_state(tracking_state),
      )
      // AI ワークアウト API
      .merge(
         Router::new()
            .route("/api/ai/workouts/generate", post(generate_workout))
            .route(
               "/api/ai/workouts/generate-and-save",
               post(generate_and_save_workout),
            )
            .route(
               "/api/ai/workouts/weekly-plan",
               post(create_weekly_workout_plan),
            )
            .route(
               "/api/ai/workouts/exercise-recommendations",
               post(recommend_exercises),
            )
            .with_state(ai_workout_state),
      )
      // AI 食事 API
      .merge(
         Router::new()
            .route("/api/ai/meals/generate", post(generate_meal))
            .route(
               "/api/ai/meals/generate-and-save",
               post(generate_and_save_meal),
            )
            .route("/api/ai/meals/daily-plan", post(create_daily_meal_plan))
            .route("/api/ai/meals/weekly-plan", post(create_weekly_meal_plan))
            .route("/api/ai/meals/recipe-suggestions", post(suggest_recipes))
            .with_state(ai_meal_state),
      )
      // スケジュール API
      .merge(
         Router::new()
            .route("/api/scheduler/daily", post(create_daily_schedule))
            .route("/api/scheduler/weekly", post(create_weekly_schedule))
            .route("/api/scheduler/get", post(get_schedule_range))
            .route("/api/scheduler/update", patch(update_schedule_item))
            .route(
               "/api/scheduler/{item_type}/{item_id}",
               delete(delete_schedule_item),
            )
            .with_state(scheduler_state),
      )
      // 外部連携 API
      .merge(
         Router::new()
            .route("/api/integrations", get(list_integrations))
            .route("/api/integrations/{id}", delete(disconnect_integration))
            .with_state(integration_state),
      )
      // Strava API
      .merge(
         Router::new()
            .route("/api/strava/connect", post(connect_strava))
            .route("/api/strava/callback", post(strava_callback))
            .route("/api/strava/stats", get(get_strava_stats))
            .route("/api/strava/activities", get(get_strava_activities))
            .route("/api/strava/sync", post(sync_strava_activities))
            .route("/api/strava/create-activity", post(create_strava_activity))
            .route("/api/strava/disconnect", delete(disconnect_strava))
            .with_state(strava_state),
      )
      .layer(from_fn_with_state(identity, require_auth));

   // ルーター構築
   // Request ID + TraceLayer により、すべての HTTP リクエストに request_id が付与されログに自動注入される
   Router::new()
      .route("/health", get(health_check))
      .merge(
         Router::new()
            .route("/health/ready", get(readiness_check))
            .with_state(readiness_state),
      )
      .merge(api)
      .layer(cors_layer(&config.allowed_origins))
      // レイヤー順序: 下に書いたものが外側
      // 1. SetRequestIdLayer（最外）: UUID v7 を生成（またはクライアント提供値を使用）
      // 2. TraceLayer: カスタムスパンに request_id を含め、全ログに自動注入
      // 3. CanonicalLogLineLayer: リクエスト完了時に 1 行サマリログを出力（スパン内）
      // 4. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
      // 5. store_request_id: task-local に保存し、外部 API 呼び出しのヘッダーに伝播
      .layer(from_fn(store_request_id))
      .layer(PropagateRequestIdLayer::x_request_id())
      .layer(CanonicalLogLineLayer::default())
      .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
      .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}

/// 許可オリジンからの資格情報付きリクエストを受け付ける CORS レイヤー
///
/// ヘッダー値として不正なオリジンは警告を出して無視する。
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
   let origins: Vec<HeaderValue> = allowed_origins
      .iter()
      .filter_map(|origin| match HeaderValue::from_str(origin) {
         Ok(value) => Some(value),
         Err(_) => {
            tracing::warn!(%origin, "不正なオリジンを CORS 設定から除外します");
            None
         }
      })
      .collect();

   CorsLayer::new()
      .allow_origin(AllowOrigin::list(origins))
      .allow_methods(AllowMethods::mirror_request())
      .allow_headers(AllowHeaders::mirror_request())
      .allow_credentials(true)
}
