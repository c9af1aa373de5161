//! RLS（Row Level Security）統合テスト
//!
//! 他ユーザーの行が見えないこと、書き込めないことを検証する。
//!
//! テスト方式:
//! - `#[sqlx::test]` で独立した DB 環境を作成
//! - superuser でテストデータを INSERT
//! - `SET ROLE fitplan_app` で非 superuser に切り替え
//! - `set_config('app.user_id', ...)` でユーザーコンテキストを設定

mod common;

use common::{date, meal, new_user, reset_role, set_app_role, strava_integration, workout};
use fitplan_domain::{meal::MealType, user::UserId};
use fitplan_infra::{
   db::{PgTransactionManager, TransactionManager},
   repository::{
      IntegrationRepository,
      MealRepository,
      PostgresIntegrationRepository,
      PostgresMealRepository,
      PostgresWorkoutRepository,
      WorkoutRepository,
   },
};
use pretty_assertions::assert_eq;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

struct TwoUserFixture {
   user_a: UserId,
   user_b: UserId,
}

/// 2 ユーザー分のワークアウト・食事・連携・プロフィールを投入する（superuser で実行）
async fn setup_two_users(pool: &PgPool) -> TwoUserFixture {
   let user_a = new_user();
   let user_b = new_user();
   let tx_manager = PgTransactionManager::new(pool.clone());
   let workouts = PostgresWorkoutRepository::new(pool.clone());
   let meals = PostgresMealRepository::new(pool.clone());
   let integrations = PostgresIntegrationRepository::new(pool.clone());

   for user_id in [&user_a, &user_b] {
      let mut tx = tx_manager.begin(user_id).await.unwrap();
      workouts
         .insert(&mut tx, &workout(user_id, "Run", date(2025, 3, 1)))
         .await
         .unwrap();
      meals
         .insert(&mut tx, &meal(user_id, MealType::Lunch, date(2025, 3, 1)))
         .await
         .unwrap();
      integrations
         .upsert(&mut tx, &strava_integration(user_id, "token"))
         .await
         .unwrap();
      tx.commit().await.unwrap();

      sqlx::query("INSERT INTO profiles (id, email) VALUES ($1, 'someone@example.com')")
         .bind(user_id.as_uuid())
         .execute(pool)
         .await
         .unwrap();
   }

   TwoUserFixture { user_a, user_b }
}

async fn set_user_context(conn: &mut PgConnection, user_id: &UserId) {
   set_app_role(conn).await;
   sqlx::query("SELECT set_config('app.user_id', $1, false)")
      .bind(user_id.to_string())
      .execute(&mut *conn)
      .await
      .unwrap();
}

async fn owners(conn: &mut PgConnection, table: &str) -> Vec<Uuid> {
   let column = if table == "profiles" { "id" } else { "user_id" };
   let rows: Vec<(Uuid,)> = sqlx::query_as(&format!("SELECT {column} FROM {table}"))
      .fetch_all(&mut *conn)
      .await
      .unwrap();
   rows.into_iter().map(|r| r.0).collect()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_自分の行だけが見える(pool: PgPool) {
   let fixture = setup_two_users(&pool).await;
   let mut conn = pool.acquire().await.unwrap();
   set_user_context(&mut conn, &fixture.user_a).await;

   for table in ["profiles", "workouts", "meals", "external_integrations"] {
      assert_eq!(
         owners(&mut conn, table).await,
         vec![*fixture.user_a.as_uuid()],
         "{table} はユーザー A の行だけを返すこと"
      );
   }

   reset_role(&mut conn).await;
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_user_id未設定時にデータが返らない(pool: PgPool) {
   setup_two_users(&pool).await;
   let mut conn = pool.acquire().await.unwrap();
   set_app_role(&mut conn).await;

   for table in ["profiles", "workouts", "meals", "external_integrations"] {
      assert!(owners(&mut conn, table).await.is_empty(), "{table}");
   }

   reset_role(&mut conn).await;
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_elevatedでは全ユーザーの行が見える(pool: PgPool) {
   setup_two_users(&pool).await;
   let mut conn = pool.acquire().await.unwrap();
   set_app_role(&mut conn).await;
   sqlx::query("SELECT set_config('app.elevated', 'on', false)")
      .execute(&mut *conn)
      .await
      .unwrap();

   assert_eq!(owners(&mut conn, "workouts").await.len(), 2);
   assert_eq!(owners(&mut conn, "profiles").await.len(), 2);

   reset_role(&mut conn).await;
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_他ユーザーの行は挿入できない(pool: PgPool) {
   let fixture = setup_two_users(&pool).await;
   let mut conn = pool.acquire().await.unwrap();
   set_user_context(&mut conn, &fixture.user_a).await;

   let result = sqlx::query(
      r#"
      INSERT INTO workouts (id, user_id, title, workout_type, scheduled_date)
      VALUES ($1, $2, 'Sneaky', 'cardio', '2025-03-01')
      "#,
   )
   .bind(Uuid::now_v7())
   .bind(fixture.user_b.as_uuid())
   .execute(&mut *conn)
   .await;

   assert!(result.is_err(), "WITH CHECK により拒否されること");
   reset_role(&mut conn).await;
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_他ユーザーの行は更新も削除もされない(pool: PgPool) {
   let fixture = setup_two_users(&pool).await;
   let mut conn = pool.acquire().await.unwrap();
   set_user_context(&mut conn, &fixture.user_a).await;

   let updated = sqlx::query("UPDATE workouts SET title = 'hijacked' WHERE user_id = $1")
      .bind(fixture.user_b.as_uuid())
      .execute(&mut *conn)
      .await
      .unwrap();
   let deleted = sqlx::query("DELETE FROM meals WHERE user_id = $1")
      .bind(fixture.user_b.as_uuid())
      .execute(&mut *conn)
      .await
      .unwrap();

   assert_eq!(updated.rows_affected(), 0);
   assert_eq!(deleted.rows_affected(), 0);
   reset_role(&mut conn).await;
}
