//! # テスト用モックリポジトリ
//!
//! ユースケーステストで使用するインメモリモックリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! fitplan-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! モックは [`TxContext::mock()`] を受け取って即座に反映する。
//! ロールバックは再現しない。

use std::sync::{
   Arc,
   Mutex,
   atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fitplan_domain::{
   dietary::DietaryPreference,
   goal::Goal,
   integration::{ExternalIntegration, IntegrationId, OAuthTokens, Provider},
   meal::{Meal, MealId},
   profile::Profile,
   schedule::{GenerationStatus, ScheduleGeneration},
   tracking::{SleepEntry, WaterIntake, WeightEntry},
   user::UserId,
   value_objects::DateRange,
   workout::{Workout, WorkoutId},
};

use crate::{
   db::{TransactionManager, TxContext},
   error::InfraError,
   repository::{
      DietaryPreferenceRepository,
      GoalRepository,
      IntegrationRepository,
      MealRepository,
      ProfileRepository,
      ScheduleGenerationRepository,
      TrackingRepository,
      WorkoutRepository,
   },
};

// ===== MockTransactionManager =====

/// `begin()` のたびに [`TxContext::mock()`] を返す
#[derive(Clone, Default)]
pub struct MockTransactionManager {
   begun: Arc<AtomicUsize>,
}

impl MockTransactionManager {
   pub fn new() -> Self {
      Self::default()
   }

   /// これまでに開始されたトランザクション数
   pub fn begun(&self) -> usize {
      self.begun.load(Ordering::SeqCst)
   }
}

#[async_trait]
impl TransactionManager for MockTransactionManager {
   async fn begin(&self, _user_id: &UserId) -> Result<TxContext, InfraError> {
      self.begun.fetch_add(1, Ordering::SeqCst);
      Ok(TxContext::mock())
   }
}

// ===== MockProfileRepository =====

#[derive(Clone, Default)]
pub struct MockProfileRepository {
   profiles: Arc<Mutex<Vec<Profile>>>,
}

impl MockProfileRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_profile(&self, profile: Profile) {
      self.profiles.lock().unwrap().push(profile);
   }
}

#[async_trait]
impl ProfileRepository for MockProfileRepository {
   async fn find_by_id(&self, user_id: &UserId) -> Result<Option<Profile>, InfraError> {
      Ok(self
         .profiles
         .lock()
         .unwrap()
         .iter()
         .find(|p| p.id() == user_id)
         .cloned())
   }

   async fn provision(&self, profile: &Profile) -> Result<(), InfraError> {
      let mut profiles = self.profiles.lock().unwrap();
      if !profiles.iter().any(|p| p.id() == profile.id()) {
         profiles.push(profile.clone());
      }
      Ok(())
   }

   async fn update(&self, _tx: &mut TxContext, profile: &Profile) -> Result<(), InfraError> {
      let mut profiles = self.profiles.lock().unwrap();
      if let Some(pos) = profiles.iter().position(|p| p.id() == profile.id()) {
         profiles[pos] = profile.clone();
      }
      Ok(())
   }
}

// ===== MockGoalRepository =====

#[derive(Clone, Default)]
pub struct MockGoalRepository {
   goals: Arc<Mutex<Vec<Goal>>>,
}

impl MockGoalRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_goal(&self, goal: Goal) {
      self.goals.lock().unwrap().push(goal);
   }
}

#[async_trait]
impl GoalRepository for MockGoalRepository {
   async fn find_all_by_user(&self, user_id: &UserId) -> Result<Vec<Goal>, InfraError> {
      Ok(self
         .goals
         .lock()
         .unwrap()
         .iter()
         .rev()
         .filter(|g| &g.user_id == user_id)
         .cloned()
         .collect())
   }

   async fn insert(&self, _tx: &mut TxContext, goal: &Goal) -> Result<(), InfraError> {
      self.goals.lock().unwrap().push(goal.clone());
      Ok(())
   }
}

// ===== MockDietaryPreferenceRepository =====

#[derive(Clone, Default)]
pub struct MockDietaryPreferenceRepository {
   preferences: Arc<Mutex<Vec<DietaryPreference>>>,
}

impl MockDietaryPreferenceRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_preference(&self, preference: DietaryPreference) {
      self.preferences.lock().unwrap().push(preference);
   }
}

#[async_trait]
impl DietaryPreferenceRepository for MockDietaryPreferenceRepository {
   async fn find_all_by_user(
      &self,
      user_id: &UserId,
   ) -> Result<Vec<DietaryPreference>, InfraError> {
      Ok(self
         .preferences
         .lock()
         .unwrap()
         .iter()
         .filter(|p| &p.user_id == user_id)
         .cloned()
         .collect())
   }
}

// ===== MockWorkoutRepository =====

#[derive(Clone, Default)]
pub struct MockWorkoutRepository {
   workouts: Arc<Mutex<Vec<Workout>>>,
}

impl MockWorkoutRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_workout(&self, workout: Workout) {
      self.workouts.lock().unwrap().push(workout);
   }

   /// 保存されている全ワークアウト（テストの検証用）
   pub fn all(&self) -> Vec<Workout> {
      self.workouts.lock().unwrap().clone()
   }
}

#[async_trait]
impl WorkoutRepository for MockWorkoutRepository {
   async fn find_by_range(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<Workout>, InfraError> {
      let mut workouts: Vec<Workout> = self
         .workouts
         .lock()
         .unwrap()
         .iter()
         .filter(|w| &w.user_id == user_id && range.contains(w.scheduled_date))
         .cloned()
         .collect();
      workouts.sort_by_key(|w| (w.scheduled_date, w.scheduled_time));
      Ok(workouts)
   }

   async fn find_recent(&self, user_id: &UserId, limit: i64) -> Result<Vec<Workout>, InfraError> {
      let mut workouts: Vec<Workout> = self
         .workouts
         .lock()
         .unwrap()
         .iter()
         .filter(|w| &w.user_id == user_id)
         .cloned()
         .collect();
      workouts.sort_by_key(|w| std::cmp::Reverse(w.scheduled_date));
      workouts.truncate(usize::try_from(limit).unwrap_or(0));
      Ok(workouts)
   }

   async fn find_by_id(
      &self,
      user_id: &UserId,
      id: &WorkoutId,
   ) -> Result<Option<Workout>, InfraError> {
      Ok(self
         .workouts
         .lock()
         .unwrap()
         .iter()
         .find(|w| &w.id == id && &w.user_id == user_id)
         .cloned())
   }

   async fn insert(&self, _tx: &mut TxContext, workout: &Workout) -> Result<(), InfraError> {
      self.workouts.lock().unwrap().push(workout.clone());
      Ok(())
   }

   async fn insert_synced(
      &self,
      _tx: &mut TxContext,
      workout: &Workout,
   ) -> Result<bool, InfraError> {
      let mut workouts = self.workouts.lock().unwrap();
      let duplicate = workout.source.is_some()
         && workouts
            .iter()
            .any(|w| w.user_id == workout.user_id && w.source == workout.source);
      if duplicate {
         return Ok(false);
      }
      workouts.push(workout.clone());
      Ok(true)
   }

   async fn update(&self, _tx: &mut TxContext, workout: &Workout) -> Result<(), InfraError> {
      let mut workouts = self.workouts.lock().unwrap();
      if let Some(pos) = workouts.iter().position(|w| w.id == workout.id) {
         workouts[pos] = workout.clone();
      }
      Ok(())
   }

   async fn delete(
      &self,
      _tx: &mut TxContext,
      user_id: &UserId,
      id: &WorkoutId,
   ) -> Result<bool, InfraError> {
      let mut workouts = self.workouts.lock().unwrap();
      let before = workouts.len();
      workouts.retain(|w| !(&w.id == id && &w.user_id == user_id));
      Ok(workouts.len() < before)
   }
}

// ===== MockMealRepository =====

#[derive(Clone, Default)]
pub struct MockMealRepository {
   meals: Arc<Mutex<Vec<Meal>>>,
}

impl MockMealRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_meal(&self, meal: Meal) {
      self.meals.lock().unwrap().push(meal);
   }

   /// 保存されている全食事（テストの検証用）
   pub fn all(&self) -> Vec<Meal> {
      self.meals.lock().unwrap().clone()
   }
}

#[async_trait]
impl MealRepository for MockMealRepository {
   async fn find_by_range(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<Meal>, InfraError> {
      let mut meals: Vec<Meal> = self
         .meals
         .lock()
         .unwrap()
         .iter()
         .filter(|m| &m.user_id == user_id && range.contains(m.scheduled_date))
         .cloned()
         .collect();
      meals.sort_by_key(|m| (m.scheduled_date, m.scheduled_time));
      Ok(meals)
   }

   async fn find_recent(&self, user_id: &UserId, limit: i64) -> Result<Vec<Meal>, InfraError> {
      let mut meals: Vec<Meal> = self
         .meals
         .lock()
         .unwrap()
         .iter()
         .filter(|m| &m.user_id == user_id)
         .cloned()
         .collect();
      meals.sort_by_key(|m| std::cmp::Reverse(m.scheduled_date));
      meals.truncate(usize::try_from(limit).unwrap_or(0));
      Ok(meals)
   }

   async fn find_by_id(&self, user_id: &UserId, id: &MealId) -> Result<Option<Meal>, InfraError> {
      Ok(self
         .meals
         .lock()
         .unwrap()
         .iter()
         .find(|m| &m.id == id && &m.user_id == user_id)
         .cloned())
   }

   async fn insert(&self, _tx: &mut TxContext, meal: &Meal) -> Result<(), InfraError> {
      self.meals.lock().unwrap().push(meal.clone());
      Ok(())
   }

   async fn update(&self, _tx: &mut TxContext, meal: &Meal) -> Result<(), InfraError> {
      let mut meals = self.meals.lock().unwrap();
      if let Some(pos) = meals.iter().position(|m| m.id == meal.id) {
         meals[pos] = meal.clone();
      }
      Ok(())
   }

   async fn delete(
      &self,
      _tx: &mut TxContext,
      user_id: &UserId,
      id: &MealId,
   ) -> Result<bool, InfraError> {
      let mut meals = self.meals.lock().unwrap();
      let before = meals.len();
      meals.retain(|m| !(&m.id == id && &m.user_id == user_id));
      Ok(meals.len() < before)
   }
}

// ===== MockTrackingRepository =====

#[derive(Clone, Default)]
pub struct MockTrackingRepository {
   sleep:  Arc<Mutex<Vec<SleepEntry>>>,
   weight: Arc<Mutex<Vec<WeightEntry>>>,
   water:  Arc<Mutex<Vec<WaterIntake>>>,
}

impl MockTrackingRepository {
   pub fn new() -> Self {
      Self::default()
   }
}

#[async_trait]
impl TrackingRepository for MockTrackingRepository {
   async fn insert_sleep(
      &self,
      _tx: &mut TxContext,
      entry: &SleepEntry,
   ) -> Result<(), InfraError> {
      self.sleep.lock().unwrap().push(entry.clone());
      Ok(())
   }

   async fn find_sleep(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<SleepEntry>, InfraError> {
      let mut entries: Vec<SleepEntry> = self
         .sleep
         .lock()
         .unwrap()
         .iter()
         .filter(|e| &e.user_id == user_id && range.contains(e.date))
         .cloned()
         .collect();
      entries.sort_by_key(|e| std::cmp::Reverse(e.date));
      Ok(entries)
   }

   async fn insert_weight(
      &self,
      _tx: &mut TxContext,
      entry: &WeightEntry,
   ) -> Result<(), InfraError> {
      self.weight.lock().unwrap().push(entry.clone());
      Ok(())
   }

   async fn find_weight(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<WeightEntry>, InfraError> {
      let mut entries: Vec<WeightEntry> = self
         .weight
         .lock()
         .unwrap()
         .iter()
         .filter(|e| &e.user_id == user_id && range.contains(e.date))
         .cloned()
         .collect();
      entries.sort_by_key(|e| std::cmp::Reverse(e.date));
      Ok(entries)
   }

   async fn insert_water(
      &self,
      _tx: &mut TxContext,
      entry: &WaterIntake,
   ) -> Result<(), InfraError> {
      self.water.lock().unwrap().push(entry.clone());
      Ok(())
   }

   async fn find_water(
      &self,
      user_id: &UserId,
      range: &DateRange,
   ) -> Result<Vec<WaterIntake>, InfraError> {
      let mut entries: Vec<WaterIntake> = self
         .water
         .lock()
         .unwrap()
         .iter()
         .filter(|e| &e.user_id == user_id && range.contains(e.date))
         .cloned()
         .collect();
      entries.sort_by_key(|e| std::cmp::Reverse(e.date));
      Ok(entries)
   }
}

// ===== MockIntegrationRepository =====

#[derive(Clone, Default)]
pub struct MockIntegrationRepository {
   integrations:  Arc<Mutex<Vec<ExternalIntegration>>>,
   token_updates: Arc<AtomicUsize>,
}

impl MockIntegrationRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_integration(&self, integration: ExternalIntegration) {
      self.integrations.lock().unwrap().push(integration);
   }

   /// 現在保存されているトークン（テストの検証用）
   pub fn stored_tokens(&self, user_id: &UserId, provider: Provider) -> Option<OAuthTokens> {
      self.integrations
         .lock()
         .unwrap()
         .iter()
         .find(|i| i.user_id() == user_id && i.provider() == provider)
         .map(|i| i.tokens().clone())
   }

   /// `update_tokens` の呼び出し回数
   pub fn token_updates(&self) -> usize {
      self.token_updates.load(Ordering::SeqCst)
   }
}

fn with_last_synced(
   integration: &ExternalIntegration,
   last_synced_at: Option<DateTime<Utc>>,
) -> ExternalIntegration {
   ExternalIntegration::from_db(
      integration.id().clone(),
      integration.user_id().clone(),
      integration.provider(),
      integration.tokens().clone(),
      integration.connected_at(),
      last_synced_at,
      integration.is_active(),
      integration.metadata().clone(),
   )
}

#[async_trait]
impl IntegrationRepository for MockIntegrationRepository {
   async fn find_all_by_user(
      &self,
      user_id: &UserId,
   ) -> Result<Vec<ExternalIntegration>, InfraError> {
      Ok(self
         .integrations
         .lock()
         .unwrap()
         .iter()
         .filter(|i| i.user_id() == user_id)
         .cloned()
         .collect())
   }

   async fn find_by_provider(
      &self,
      user_id: &UserId,
      provider: Provider,
   ) -> Result<Option<ExternalIntegration>, InfraError> {
      Ok(self
         .integrations
         .lock()
         .unwrap()
         .iter()
         .find(|i| i.user_id() == user_id && i.provider() == provider)
         .cloned())
   }

   async fn upsert(
      &self,
      _tx: &mut TxContext,
      integration: &ExternalIntegration,
   ) -> Result<ExternalIntegration, InfraError> {
      let mut integrations = self.integrations.lock().unwrap();
      let existing = integrations.iter().position(|i| {
         i.user_id() == integration.user_id() && i.provider() == integration.provider()
      });

      let stored = match existing {
         Some(pos) => {
            let previous = &integrations[pos];
            let merged = ExternalIntegration::from_db(
               previous.id().clone(),
               integration.user_id().clone(),
               integration.provider(),
               integration.tokens().clone(),
               integration.connected_at(),
               previous.last_synced_at(),
               integration.is_active(),
               integration.metadata().clone(),
            );
            integrations[pos] = merged.clone();
            merged
         }
         None => {
            integrations.push(integration.clone());
            integration.clone()
         }
      };
      Ok(stored)
   }

   async fn update_tokens(
      &self,
      _tx: &mut TxContext,
      id: &IntegrationId,
      tokens: &OAuthTokens,
   ) -> Result<(), InfraError> {
      self.token_updates.fetch_add(1, Ordering::SeqCst);
      let mut integrations = self.integrations.lock().unwrap();
      if let Some(pos) = integrations.iter().position(|i| i.id() == id) {
         integrations[pos] = integrations[pos].clone().with_tokens(tokens.clone());
      }
      Ok(())
   }

   async fn touch_last_synced(
      &self,
      _tx: &mut TxContext,
      id: &IntegrationId,
      synced_at: DateTime<Utc>,
   ) -> Result<(), InfraError> {
      let mut integrations = self.integrations.lock().unwrap();
      if let Some(pos) = integrations.iter().position(|i| i.id() == id) {
         integrations[pos] = with_last_synced(&integrations[pos], Some(synced_at));
      }
      Ok(())
   }

   async fn delete_by_id(
      &self,
      _tx: &mut TxContext,
      user_id: &UserId,
      id: &IntegrationId,
   ) -> Result<bool, InfraError> {
      let mut integrations = self.integrations.lock().unwrap();
      let before = integrations.len();
      integrations.retain(|i| !(i.id() == id && i.user_id() == user_id));
      Ok(integrations.len() < before)
   }

   async fn delete_by_provider(
      &self,
      _tx: &mut TxContext,
      user_id: &UserId,
      provider: Provider,
   ) -> Result<bool, InfraError> {
      let mut integrations = self.integrations.lock().unwrap();
      let before = integrations.len();
      integrations.retain(|i| !(i.provider() == provider && i.user_id() == user_id));
      Ok(integrations.len() < before)
   }
}

// ===== MockScheduleGenerationRepository =====

#[derive(Clone, Default)]
pub struct MockScheduleGenerationRepository {
   records: Arc<Mutex<Vec<ScheduleGeneration>>>,
}

impl MockScheduleGenerationRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_record(&self, record: ScheduleGeneration) {
      self.records.lock().unwrap().push(record);
   }
}

#[async_trait]
impl ScheduleGenerationRepository for MockScheduleGenerationRepository {
   async fn claim(
      &self,
      user_id: &UserId,
      schedule_date: NaiveDate,
      now: DateTime<Utc>,
   ) -> Result<bool, InfraError> {
      let mut records = self.records.lock().unwrap();
      let existing = records
         .iter()
         .position(|r| r.user_id() == user_id && r.schedule_date() == schedule_date);

      match existing {
         None => {
            records.push(ScheduleGeneration::claim(
               user_id.clone(),
               schedule_date,
               now,
            ));
            Ok(true)
         }
         Some(pos) if records[pos].is_reclaimable(now) => {
            records[pos] = ScheduleGeneration::claim(user_id.clone(), schedule_date, now);
            Ok(true)
         }
         Some(_) => Ok(false),
      }
   }

   async fn complete(
      &self,
      _tx: &mut TxContext,
      user_id: &UserId,
      schedule_date: NaiveDate,
      now: DateTime<Utc>,
   ) -> Result<(), InfraError> {
      let mut records = self.records.lock().unwrap();
      if let Some(pos) = records
         .iter()
         .position(|r| r.user_id() == user_id && r.schedule_date() == schedule_date)
      {
         records[pos] = records[pos].clone().completed(now);
      }
      Ok(())
   }

   async fn release(&self, user_id: &UserId, schedule_date: NaiveDate) -> Result<(), InfraError> {
      self.records.lock().unwrap().retain(|r| {
         !(r.user_id() == user_id
            && r.schedule_date() == schedule_date
            && r.status() == GenerationStatus::Pending)
      });
      Ok(())
   }

   async fn find(
      &self,
      user_id: &UserId,
      schedule_date: NaiveDate,
   ) -> Result<Option<ScheduleGeneration>, InfraError> {
      Ok(self
         .records
         .lock()
         .unwrap()
         .iter()
         .find(|r| r.user_id() == user_id && r.schedule_date() == schedule_date)
         .cloned())
   }
}
