//! 健康記録ユースケース
//!
//! 睡眠・体重・水分摂取を記録し、日付範囲で新しい順に返す。
//! 入力値の範囲チェックはドメインの `New*` 型で行い、違反は 400 になる。

use std::sync::Arc;

use fitplan_domain::{
   clock::Clock,
   tracking::{
      NewSleepEntry,
      NewWaterIntake,
      NewWeightEntry,
      SampleId,
      SleepEntry,
      WaterIntake,
      WeightEntry,
   },
   user::UserId,
   value_objects::DateRange,
};
use fitplan_infra::{db::TransactionManager, repository::TrackingRepository};

use crate::error::BffError;

/// 健康記録ユースケース
pub struct TrackingUseCaseImpl {
   tracking:   Arc<dyn TrackingRepository>,
   tx_manager: Arc<dyn TransactionManager>,
   clock:      Arc<dyn Clock>,
}

impl TrackingUseCaseImpl {
   pub fn new(
      tracking: Arc<dyn TrackingRepository>,
      tx_manager: Arc<dyn TransactionManager>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         tracking,
         tx_manager,
         clock,
      }
   }

   pub async fn record_sleep(
      &self,
      user_id: &UserId,
      input: NewSleepEntry,
   ) -> Result<SleepEntry, BffError> {
      let entry = input.into_entry(SampleId::new(), user_id.clone(), self.clock.now());

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.tracking.insert_sleep(&mut tx, &entry).await?;
      tx.commit().await?;

      Ok(entry)
   }

   pub async fn list_sleep(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<SleepEntry>, BffError> {
      Ok(self.tracking.find_sleep(user_id, range).await?)
   }

   pub async fn record_weight(
      &self,
      user_id: &UserId,
      input: NewWeightEntry,
   ) -> Result<WeightEntry, BffError> {
      let entry = input.into_entry(SampleId::new(), user_id.clone(), self.clock.now());

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.tracking.insert_weight(&mut tx, &entry).await?;
      tx.commit().await?;

      Ok(entry)
   }

   pub async fn list_weight(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<WeightEntry>, BffError> {
      Ok(self.tracking.find_weight(user_id, range).await?)
   }

   pub async fn record_water(
      &self,
      user_id: &UserId,
      input: NewWaterIntake,
   ) -> Result<WaterIntake, BffError> {
      let entry = input.into_entry(SampleId::new(), user_id.clone(), self.clock.now());

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.tracking.insert_water(&mut tx, &entry).await?;
      tx.commit().await?;

      Ok(entry)
   }

   pub async fn list_water(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<WaterIntake>, BffError> {
      Ok(self.tracking.find_water(user_id, range).await?)
   }
}

#[cfg(test)]
mod tests {
   use chrono::{NaiveDate, TimeZone, Utc};
   use fitplan_domain::clock::FixedClock;
   use fitplan_infra::mock::{MockTrackingRepository, MockTransactionManager};
   use pretty_assertions::assert_eq;

   use super::*;

   fn sut() -> TrackingUseCaseImpl {
      TrackingUseCaseImpl::new(
         Arc::new(MockTrackingRepository::new()),
         Arc::new(MockTransactionManager::new()),
         Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
         )),
      )
   }

   fn date(day: u32) -> NaiveDate {
      NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
   }

   #[tokio::test]
   async fn test_list_sleep_範囲内を新しい順に返す() {
      let sut = sut();
      let user_id = UserId::new();
      for day in [1, 3, 5] {
         sut.record_sleep(
            &user_id,
            NewSleepEntry::new(date(day), 7.5, 4, None).unwrap(),
         )
         .await
         .unwrap();
      }

      let entries = sut
         .list_sleep(&user_id, &DateRange::new(Some(date(2)), None).unwrap())
         .await
         .unwrap();

      let dates: Vec<_> = entries.iter().map(|e| e.date).collect();
      assert_eq!(dates, vec![date(5), date(3)]);
   }

   #[tokio::test]
   async fn test_record_weight_他ユーザーの一覧には含まれない() {
      let sut = sut();
      let owner = UserId::new();
      sut.record_weight(&owner, NewWeightEntry::new(date(1), 70.2, None).unwrap())
         .await
         .unwrap();

      let others = sut
         .list_weight(&UserId::new(), &DateRange::unbounded())
         .await
         .unwrap();

      assert!(others.is_empty());
   }

   #[tokio::test]
   async fn test_record_water_記録時刻に時計の現在時刻を使う() {
      let sut = sut();
      let user_id = UserId::new();

      let entry = sut
         .record_water(&user_id, NewWaterIntake::new(date(1), 500).unwrap())
         .await
         .unwrap();

      assert_eq!(entry.amount_ml, 500);
      assert_eq!(
         entry.created_at,
         Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
      );
   }
}
