//! ProfileRepository 統合テスト

mod common;

use chrono::Duration;
use common::{new_user, test_now};
use fitplan_domain::{
   profile::{ActivityLevel, DisplayName, Gender, Profile, ProfileUpdate},
   user::Email,
};
use fitplan_infra::{
   db::{PgTransactionManager, TransactionManager},
   repository::{PostgresProfileRepository, ProfileRepository},
};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn test_初期作成は冪等で既存の値を上書きしない(pool: PgPool) {
   let tx_manager = PgTransactionManager::new(pool.clone());
   let sut = PostgresProfileRepository::new(pool);
   let user_id = new_user();
   let profile = Profile::provision(
      user_id.clone(),
      Email::new("jane@example.com").unwrap(),
      test_now(),
   );

   sut.provision(&profile).await.unwrap();
   let updated = profile
      .clone()
      .updated(
         ProfileUpdate {
            display_name: Some(DisplayName::new("Jane").unwrap()),
            height_cm: Some(165),
            weight_kg: Some(58.5),
            age: Some(31),
            gender: Some(Gender::Female),
            activity_level: Some(ActivityLevel::VeryActive),
         },
         test_now() + Duration::minutes(1),
      )
      .unwrap();
   let mut tx = tx_manager.begin(&user_id).await.unwrap();
   sut.update(&mut tx, &updated).await.unwrap();
   tx.commit().await.unwrap();

   // 2 回目の初期作成は何もしない
   sut.provision(&profile).await.unwrap();

   let found = sut.find_by_id(&user_id).await.unwrap().unwrap();
   assert_eq!(found, updated);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_未作成のプロフィールはnone(pool: PgPool) {
   let sut = PostgresProfileRepository::new(pool);

   assert!(sut.find_by_id(&new_user()).await.unwrap().is_none());
}
