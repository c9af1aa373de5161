//! # BFF API 結合テスト
//!
//! `build_app` で組み立てたルーター全体に対して、認証・CRUD・スケジュール生成・
//! エラー変換をリクエスト単位で検証する。

mod common;

use common::{authed, body_json, test_app};
use http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_ヘルスチェックは認証なしで200() {
   let app = test_app();

   let response = app
      .router
      .oneshot(
         Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap(),
      )
      .await
      .unwrap();

   assert_eq!(response.status(), StatusCode::OK);
   let body = body_json(response).await;
   assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_トークンなしのapi呼び出しは401() {
   let app = test_app();

   let response = app
      .router
      .oneshot(
         Request::builder()
            .uri("/api/workouts")
            .body(axum::body::Body::empty())
            .unwrap(),
      )
      .await
      .unwrap();

   assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
   let body = body_json(response).await;
   assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn test_拒否されたトークンは401() {
   let app = test_app();

   let response = app
      .router
      .oneshot(
         Request::builder()
            .uri("/api/meals")
            .header(http::header::AUTHORIZATION, "Bearer expired")
            .body(axum::body::Body::empty())
            .unwrap(),
      )
      .await
      .unwrap();

   assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ワークアウトを作成すると一覧に含まれる() {
   let app = test_app();

   let created = app
      .router
      .clone()
      .oneshot(authed(
         "POST",
         "/api/workouts",
         Some(json!({
            "title": "Morning Run",
            "workout_type": "cardio",
            "duration_minutes": 30,
            "scheduled_date": "2025-03-02"
         })),
      ))
      .await
      .unwrap();
   assert_eq!(created.status(), StatusCode::OK);
   let created = body_json(created).await;
   assert_eq!(created["title"], "Morning Run");
   assert_eq!(created["user_id"], app.user_id.to_string());
   assert_eq!(created["completed"], false);

   let listed = app
      .router
      .oneshot(authed(
         "GET",
         "/api/workouts?start_date=2025-03-01&end_date=2025-03-07",
         None,
      ))
      .await
      .unwrap();
   assert_eq!(listed.status(), StatusCode::OK);
   let listed = body_json(listed).await;
   assert_eq!(listed.as_array().unwrap().len(), 1);
   assert_eq!(listed[0]["id"], created["id"]);
}

#[tokio::test]
async fn test_空タイトルのワークアウトは400() {
   let app = test_app();

   let response = app
      .router
      .oneshot(authed(
         "POST",
         "/api/workouts",
         Some(json!({
            "title": "",
            "workout_type": "cardio",
            "scheduled_date": "2025-03-02"
         })),
      ))
      .await
      .unwrap();

   assert_eq!(response.status(), StatusCode::BAD_REQUEST);
   assert!(app.workouts.all().is_empty());
}

#[tokio::test]
async fn test_存在しない食事の更新は404() {
   let app = test_app();

   let response = app
      .router
      .oneshot(authed(
         "PATCH",
         &format!("/api/meals/{}", uuid::Uuid::now_v7()),
         Some(json!({"completed": true})),
      ))
      .await
      .unwrap();

   assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_日次スケジュールは固定の時刻に保存され2回目は既存を返す() {
   let app = test_app();

   let first = app
      .router
      .clone()
      .oneshot(authed(
         "POST",
         "/api/scheduler/daily",
         Some(json!({"date": "2025-03-01"})),
      ))
      .await
      .unwrap();
   assert_eq!(first.status(), StatusCode::OK);
   let first = body_json(first).await;
   assert_eq!(first["success"], true);
   assert_eq!(first["message"], "Daily schedule generated successfully");

   let schedule = &first["schedule"];
   assert_eq!(schedule["generated"], true);
   assert_eq!(schedule["workouts"][0]["scheduled_time"], "07:00:00");
   let meal_time = |meal_type: &str| {
      schedule["meals"]
         .as_array()
         .unwrap()
         .iter()
         .find(|m| m["meal_type"] == meal_type)
         .map(|m| m["scheduled_time"].clone())
         .unwrap()
   };
   assert_eq!(meal_time("breakfast"), "08:00:00");
   assert_eq!(meal_time("lunch"), "12:30:00");
   assert_eq!(meal_time("snack"), "15:00:00");
   assert_eq!(meal_time("dinner"), "18:30:00");
   assert_eq!(schedule["daily_nutrition"]["calories"], 2000);
   assert_eq!(app.workouts.all().len(), 1);
   assert_eq!(app.meals.all().len(), 4);
   let calls = app.llm.calls();

   let second = app
      .router
      .oneshot(authed(
         "POST",
         "/api/scheduler/daily",
         Some(json!({"date": "2025-03-01"})),
      ))
      .await
      .unwrap();
   assert_eq!(second.status(), StatusCode::OK);
   let second = body_json(second).await;
   assert_eq!(second["message"], "Existing schedule retrieved");
   assert_eq!(second["schedule"]["generated"], false);
   assert_eq!(second["schedule"]["meals"].as_array().unwrap().len(), 4);
   assert_eq!(app.llm.calls(), calls);
   assert_eq!(app.meals.all().len(), 4);
}

#[tokio::test]
async fn test_週次スケジュールのdays_per_weekが範囲外なら400() {
   let app = test_app();

   let response = app
      .router
      .oneshot(authed(
         "POST",
         "/api/scheduler/weekly",
         Some(json!({"start_date": "2025-03-03", "days_per_week": 8})),
      ))
      .await
      .unwrap();

   assert_eq!(response.status(), StatusCode::BAD_REQUEST);
   assert_eq!(app.llm.calls(), 0);
}

#[tokio::test]
async fn test_未知の種別のスケジュール項目削除は400() {
   let app = test_app();

   let response = app
      .router
      .oneshot(authed(
         "DELETE",
         &format!("/api/scheduler/sleep/{}", uuid::Uuid::now_v7()),
         None,
      ))
      .await
      .unwrap();

   assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_strava未接続で統計を取得すると404() {
   let app = test_app();

   let response = app
      .router
      .oneshot(authed("GET", "/api/strava/stats", None))
      .await
      .unwrap();

   assert_eq!(response.status(), StatusCode::NOT_FOUND);
   let body = body_json(response).await;
   assert_eq!(body["detail"], "Strava integration not found");
}

#[tokio::test]
async fn test_strava接続は認可urlを返す() {
   let app = test_app();

   let response = app
      .router
      .oneshot(authed(
         "POST",
         "/api/strava/connect",
         Some(json!({"redirect_uri": "http://localhost:3000/strava/callback"})),
      ))
      .await
      .unwrap();

   assert_eq!(response.status(), StatusCode::OK);
   let body = body_json(response).await;
   let url = body["authorization_url"].as_str().unwrap();
   assert!(url.starts_with("https://www.strava.com/oauth/authorize?"));
   assert!(url.contains("client_id=12345"));
   assert!(url.contains(&format!("state={}%3A", app.user_id)));
}

#[tokio::test]
async fn test_許可オリジンのプリフライトに資格情報付きで応答する() {
   let app = test_app();

   let response = app
      .router
      .oneshot(
         Request::builder()
            .method("OPTIONS")
            .uri("/api/workouts")
            .header(http::header::ORIGIN, "http://localhost:3000")
            .header(http::header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(http::header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
            .body(axum::body::Body::empty())
            .unwrap(),
      )
      .await
      .unwrap();

   let headers = response.headers();
   assert_eq!(
      headers.get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
      "http://localhost:3000"
   );
   assert_eq!(
      headers
         .get(http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
         .unwrap(),
      "true"
   );
}
