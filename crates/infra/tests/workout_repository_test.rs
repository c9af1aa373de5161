//! WorkoutRepository 統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p fitplan-infra --test workout_repository_test
//! ```

mod common;

use chrono::Duration;
use common::{date, new_user, seven_am, synced_workout, test_now, workout};
use fitplan_domain::{
   value_objects::{DateRange, ItemUpdate},
   workout::WorkoutId,
};
use fitplan_infra::{
   db::{PgTransactionManager, TransactionManager},
   repository::{PostgresWorkoutRepository, WorkoutRepository},
};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn test_期間指定で予定日の昇順に取得できる(pool: PgPool) {
   let tx_manager = PgTransactionManager::new(pool.clone());
   let sut = PostgresWorkoutRepository::new(pool);
   let user_id = new_user();

   let mut tx = tx_manager.begin(&user_id).await.unwrap();
   for (title, day) in [("C", 5), ("A", 1), ("B", 3), ("Out", 20)] {
      sut.insert(&mut tx, &workout(&user_id, title, date(2025, 3, day)))
         .await
         .unwrap();
   }
   tx.commit().await.unwrap();

   let range = DateRange::between(date(2025, 3, 1), date(2025, 3, 7)).unwrap();
   let titles: Vec<String> = sut
      .find_by_range(&user_id, &range)
      .await
      .unwrap()
      .into_iter()
      .map(|w| w.title)
      .collect();

   assert_eq!(titles, vec!["A", "B", "C"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_直近のワークアウトは新しい順にlimit件(pool: PgPool) {
   let tx_manager = PgTransactionManager::new(pool.clone());
   let sut = PostgresWorkoutRepository::new(pool);
   let user_id = new_user();

   let mut tx = tx_manager.begin(&user_id).await.unwrap();
   for day in 1..=7 {
      sut.insert(&mut tx, &workout(&user_id, &format!("Day {day}"), date(2025, 3, day)))
         .await
         .unwrap();
   }
   tx.commit().await.unwrap();

   let recent = sut.find_recent(&user_id, 5).await.unwrap();

   assert_eq!(recent.len(), 5);
   assert_eq!(recent[0].title, "Day 7");
   assert_eq!(recent[4].title, "Day 3");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_同じ外部idの取り込みは読み飛ばされる(pool: PgPool) {
   let tx_manager = PgTransactionManager::new(pool.clone());
   let sut = PostgresWorkoutRepository::new(pool);
   let user_id = new_user();
   let other_user = new_user();

   let mut tx = tx_manager.begin(&user_id).await.unwrap();
   let first = sut
      .insert_synced(&mut tx, &synced_workout(&user_id, "1001"))
      .await
      .unwrap();
   let second = sut
      .insert_synced(&mut tx, &synced_workout(&user_id, "1001"))
      .await
      .unwrap();
   let different = sut
      .insert_synced(&mut tx, &synced_workout(&user_id, "1002"))
      .await
      .unwrap();
   tx.commit().await.unwrap();

   // 別ユーザーは同じ外部 ID でも取り込める
   let mut tx = tx_manager.begin(&other_user).await.unwrap();
   let other = sut
      .insert_synced(&mut tx, &synced_workout(&other_user, "1001"))
      .await
      .unwrap();
   tx.commit().await.unwrap();

   assert!(first);
   assert!(!second);
   assert!(different);
   assert!(other);
   let stored = sut
      .find_by_range(&user_id, &DateRange::unbounded())
      .await
      .unwrap();
   assert_eq!(stored.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_手動作成のワークアウトは外部idなしで何件でも登録できる(pool: PgPool) {
   let tx_manager = PgTransactionManager::new(pool.clone());
   let sut = PostgresWorkoutRepository::new(pool);
   let user_id = new_user();

   let mut tx = tx_manager.begin(&user_id).await.unwrap();
   for _ in 0..2 {
      assert!(sut
         .insert_synced(&mut tx, &workout(&user_id, "Run", date(2025, 3, 1)))
         .await
         .unwrap());
   }
   tx.commit().await.unwrap();
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_更新内容が保存される(pool: PgPool) {
   let tx_manager = PgTransactionManager::new(pool.clone());
   let sut = PostgresWorkoutRepository::new(pool);
   let user_id = new_user();
   let original = workout(&user_id, "Run", date(2025, 3, 1));

   let mut tx = tx_manager.begin(&user_id).await.unwrap();
   sut.insert(&mut tx, &original).await.unwrap();
   tx.commit().await.unwrap();

   let done_at = test_now() + Duration::hours(8);
   let updated = original.clone().updated(
      ItemUpdate {
         completed: Some(true),
         scheduled_time: Some(seven_am()),
         notes: Some("felt great".to_string()),
         ..Default::default()
      },
      done_at,
   );
   let mut tx = tx_manager.begin(&user_id).await.unwrap();
   sut.update(&mut tx, &updated).await.unwrap();
   tx.commit().await.unwrap();

   let found = sut.find_by_id(&user_id, &original.id).await.unwrap().unwrap();
   assert!(found.completed);
   assert_eq!(found.completed_at, Some(done_at));
   assert_eq!(found.scheduled_time, Some(seven_am()));
   assert_eq!(found.notes.as_deref(), Some("felt great"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_他ユーザーのワークアウトは取得も削除もできない(pool: PgPool) {
   let tx_manager = PgTransactionManager::new(pool.clone());
   let sut = PostgresWorkoutRepository::new(pool);
   let owner = new_user();
   let stranger = new_user();
   let target = workout(&owner, "Run", date(2025, 3, 1));

   let mut tx = tx_manager.begin(&owner).await.unwrap();
   sut.insert(&mut tx, &target).await.unwrap();
   tx.commit().await.unwrap();

   assert!(sut.find_by_id(&stranger, &target.id).await.unwrap().is_none());

   let mut tx = tx_manager.begin(&stranger).await.unwrap();
   assert!(!sut.delete(&mut tx, &stranger, &target.id).await.unwrap());
   tx.commit().await.unwrap();

   let mut tx = tx_manager.begin(&owner).await.unwrap();
   assert!(sut.delete(&mut tx, &owner, &target.id).await.unwrap());
   assert!(!sut.delete(&mut tx, &owner, &WorkoutId::new()).await.unwrap());
   tx.commit().await.unwrap();
}
