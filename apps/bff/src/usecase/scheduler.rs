//! # スケジュールユースケース
//!
//! ワークアウトと食事の生成を束ねて、日次・週次のスケジュールを作る。
//!
//! ## 冪等性
//!
//! 日付ごとに `schedule_generations` を claim できたリクエストだけが生成する。
//! claim できなければ（生成済み・生成中）既存の行をそのまま返す。
//! claim できても、手動登録などでワークアウトか食事が既にある日付は生成せず、
//! 記録を完了にしてその行を返す。
//! 1 日分の書き込みは claim の完了と同じトランザクションで行い、
//! 失敗したら claim を解放するため、途中までのスケジュールは残らない。

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use fitplan_domain::{
   clock::Clock,
   generation::{DailyMealPlan, PlannedWorkoutDay},
   meal::{Meal, MealId},
   nutrition::NutritionTotals,
   schedule::{ScheduleItemType, ScheduledDay, day_name, group_by_date, workout_slot},
   user::UserId,
   value_objects::{DateRange, ItemUpdate},
   workout::{Workout, WorkoutId},
};
use fitplan_infra::{
   db::TransactionManager,
   repository::{MealRepository, ScheduleGenerationRepository, WorkoutRepository},
};
use fitplan_shared::{event_log::event, log_business_event};
use uuid::Uuid;

use super::{
   generation::{GenerationError, Preferences},
   meal::MealUseCaseImpl,
   meal_planner::MealPlannerUseCaseImpl,
   workout::WorkoutUseCaseImpl,
   workout_generator::WorkoutGeneratorUseCaseImpl,
};
use crate::error::BffError;

/// 週間スケジュールの日数
const DAYS_IN_WEEK: u64 = 7;

/// 日次スケジュール
#[derive(Debug, Clone, PartialEq)]
pub struct DailySchedule {
   pub date:            NaiveDate,
   pub workouts:        Vec<Workout>,
   pub meals:           Vec<Meal>,
   /// このリクエストで生成したか（既存を返した場合は `false`）
   pub generated:       bool,
   /// 生成した場合のみ（4 食の合計）
   pub daily_nutrition: Option<NutritionTotals>,
}

/// 週間スケジュールの 1 日分
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyScheduleDay {
   pub date:            NaiveDate,
   pub day_name:        String,
   pub workouts:        Vec<Workout>,
   pub meals:           Vec<Meal>,
   pub daily_nutrition: NutritionTotals,
}

/// 週間スケジュール
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySchedule {
   pub start_date: NaiveDate,
   pub end_date:   NaiveDate,
   pub days:       Vec<WeeklyScheduleDay>,
}

/// 更新後の項目
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleItem {
   Workout(Workout),
   Meal(Meal),
}

/// 1 日分の書き込み内容
struct DayRows {
   workouts: Vec<Workout>,
   meals:    Vec<Meal>,
}

impl DayRows {
   fn is_empty(&self) -> bool {
      self.workouts.is_empty() && self.meals.is_empty()
   }
}

/// スケジュールユースケース
pub struct SchedulerUseCaseImpl {
   workout_generator: Arc<WorkoutGeneratorUseCaseImpl>,
   meal_planner:      Arc<MealPlannerUseCaseImpl>,
   workout_items:     Arc<WorkoutUseCaseImpl>,
   meal_items:        Arc<MealUseCaseImpl>,
   workouts:          Arc<dyn WorkoutRepository>,
   meals:             Arc<dyn MealRepository>,
   schedules:         Arc<dyn ScheduleGenerationRepository>,
   tx_manager:        Arc<dyn TransactionManager>,
   clock:             Arc<dyn Clock>,
}

impl SchedulerUseCaseImpl {
   #[allow(clippy::too_many_arguments)]
   pub fn new(
      workout_generator: Arc<WorkoutGeneratorUseCaseImpl>,
      meal_planner: Arc<MealPlannerUseCaseImpl>,
      workout_items: Arc<WorkoutUseCaseImpl>,
      meal_items: Arc<MealUseCaseImpl>,
      workouts: Arc<dyn WorkoutRepository>,
      meals: Arc<dyn MealRepository>,
      schedules: Arc<dyn ScheduleGenerationRepository>,
      tx_manager: Arc<dyn TransactionManager>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         workout_generator,
         meal_planner,
         workout_items,
         meal_items,
         workouts,
         meals,
         schedules,
         tx_manager,
         clock,
      }
   }

   /// 1 日分のスケジュールを生成する
   ///
   /// 既に予定がある（または生成中の）日付は既存の行を返す。
   #[tracing::instrument(skip_all, fields(%user_id, %date))]
   pub async fn daily(&self, user_id: &UserId, date: NaiveDate) -> Result<DailySchedule, BffError> {
      if let Some(existing) = self.claim_day(user_id, date).await? {
         tracing::info!("予定がある日付のため既存の予定を返します");
         return Ok(DailySchedule {
            date,
            workouts: existing.workouts,
            meals: existing.meals,
            generated: false,
            daily_nutrition: None,
         });
      }

      let result = self.generate_daily(user_id, date).await;
      let (rows, plan) = self.finish_claim(user_id, date, result).await?;

      log_business_event!(
         event.category = event::category::SCHEDULE,
         event.action = event::action::DAILY_SCHEDULE_GENERATED,
         event.entity_type = event::entity_type::SCHEDULE_GENERATION,
         event.entity_id = %date,
         event.user_id = %user_id,
         event.result = event::result::SUCCESS,
         workouts = rows.workouts.len(),
         meals = rows.meals.len(),
         "日次スケジュールを生成"
      );

      Ok(DailySchedule {
         date,
         workouts: rows.workouts,
         meals: rows.meals,
         generated: true,
         daily_nutrition: Some(plan.daily_totals),
      })
   }

   async fn generate_daily(
      &self,
      user_id: &UserId,
      date: NaiveDate,
   ) -> Result<(DayRows, DailyMealPlan), BffError> {
      let mut preferences = Preferences::new();
      preferences.insert("scheduled_date".to_string(), date.to_string().into());

      let (workout, meal_plan) = tokio::join!(
         self.workout_generator.generate(user_id, &preferences),
         self.meal_planner.daily_plan(user_id, date),
      );
      let (workout, meal_plan) = (workout?, meal_plan?);

      let now = self.clock.now();
      let workout = workout
         .to_new_workout(date, Some(workout_slot()), workout.scheduled_notes())
         .map_err(GenerationError::Artifact)?
         .into_workout(WorkoutId::new(), user_id.clone(), now);
      let meals = meal_plan
         .meals
         .iter()
         .map(|(meal_type, meal)| {
            meal.to_new_meal(
               *meal_type,
               date,
               Some(meal_type.default_time()),
               meal.scheduled_notes(),
            )
            .map(|m| m.into_meal(MealId::new(), user_id.clone(), now))
            .map_err(GenerationError::Artifact)
         })
         .collect::<Result<Vec<_>, _>>()?;

      let rows = DayRows {
         workouts: vec![workout],
         meals,
      };
      self.write_day(user_id, date, &rows).await?;
      Ok((rows, meal_plan))
   }

   /// 週間スケジュールを生成する
   ///
   /// ワークアウトの週間プランは最初に 1 回だけ生成し、食事は日ごとに生成する。
   /// 既に予定がある日と生成中の日は既存の行を返す。
   #[tracing::instrument(skip_all, fields(%user_id, %start_date))]
   pub async fn weekly(
      &self,
      user_id: &UserId,
      start_date: NaiveDate,
      days_per_week: u8,
   ) -> Result<WeeklySchedule, BffError> {
      let plan = self
         .workout_generator
         .weekly_plan(user_id, days_per_week)
         .await?;

      let mut days = Vec::new();
      for (offset, day_number) in (0..DAYS_IN_WEEK).zip(1..) {
         let date = start_date + Days::new(offset);

         let rows = match self.claim_day(user_id, date).await? {
            Some(existing) => existing,
            None => {
               let result = self
                  .generate_weekly_day(user_id, date, plan.workout_for_day(day_number))
                  .await;
               self.finish_claim(user_id, date, result).await?
            }
         };

         days.push(WeeklyScheduleDay {
            date,
            day_name: day_name(date),
            daily_nutrition: NutritionTotals::of_meals(&rows.meals),
            workouts: rows.workouts,
            meals: rows.meals,
         });
      }

      log_business_event!(
         event.category = event::category::SCHEDULE,
         event.action = event::action::WEEKLY_SCHEDULE_GENERATED,
         event.entity_type = event::entity_type::SCHEDULE_GENERATION,
         event.entity_id = %start_date,
         event.user_id = %user_id,
         event.result = event::result::SUCCESS,
         "週間スケジュールを生成"
      );

      Ok(WeeklySchedule {
         start_date,
         end_date: start_date + Days::new(DAYS_IN_WEEK - 1),
         days,
      })
   }

   async fn generate_weekly_day(
      &self,
      user_id: &UserId,
      date: NaiveDate,
      planned: Option<&PlannedWorkoutDay>,
   ) -> Result<DayRows, BffError> {
      let meal_plan = self.meal_planner.daily_plan(user_id, date).await?;

      let now = self.clock.now();
      let workouts = planned
         .map(|day| {
            day.to_new_workout(date, Some(workout_slot()))
               .map(|w| w.into_workout(WorkoutId::new(), user_id.clone(), now))
               .map_err(GenerationError::Artifact)
         })
         .transpose()?
         .into_iter()
         .collect();
      let meals = meal_plan
         .meals
         .iter()
         .map(|(meal_type, meal)| {
            meal.to_new_meal(
               *meal_type,
               date,
               Some(meal_type.default_time()),
               meal.prep_notes(),
            )
            .map(|m| m.into_meal(MealId::new(), user_id.clone(), now))
            .map_err(GenerationError::Artifact)
         })
         .collect::<Result<Vec<_>, _>>()?;

      let rows = DayRows { workouts, meals };
      self.write_day(user_id, date, &rows).await?;
      Ok(rows)
   }

   /// 日付を claim し、生成してよければ `None` を返す
   ///
   /// claim できなかった日と、claim できてもワークアウトか食事が既にある日は
   /// その日の行を返す。後者は記録を完了にして以降の claim を止める。
   async fn claim_day(
      &self,
      user_id: &UserId,
      date: NaiveDate,
   ) -> Result<Option<DayRows>, BffError> {
      if !self.schedules.claim(user_id, date, self.clock.now()).await? {
         return self.existing_day(user_id, date).await.map(Some);
      }

      let result = self.adopt_existing_day(user_id, date).await;
      self.finish_claim(user_id, date, result).await
   }

   async fn adopt_existing_day(
      &self,
      user_id: &UserId,
      date: NaiveDate,
   ) -> Result<Option<DayRows>, BffError> {
      let existing = self.existing_day(user_id, date).await?;
      if existing.is_empty() {
         return Ok(None);
      }

      let mut tx = self.tx_manager.begin(user_id).await?;
      self.schedules
         .complete(&mut tx, user_id, date, self.clock.now())
         .await?;
      tx.commit().await?;
      Ok(Some(existing))
   }

   /// 1 日分の行と claim の完了を同じトランザクションで書き込む
   async fn write_day(
      &self,
      user_id: &UserId,
      date: NaiveDate,
      rows: &DayRows,
   ) -> Result<(), BffError> {
      let mut tx = self.tx_manager.begin(user_id).await?;
      for workout in &rows.workouts {
         self.workouts.insert(&mut tx, workout).await?;
      }
      for meal in &rows.meals {
         self.meals.insert(&mut tx, meal).await?;
      }
      self.schedules
         .complete(&mut tx, user_id, date, self.clock.now())
         .await?;
      tx.commit().await?;
      Ok(())
   }

   /// 生成に失敗した場合は claim を解放してからエラーを返す
   async fn finish_claim<T>(
      &self,
      user_id: &UserId,
      date: NaiveDate,
      result: Result<T, BffError>,
   ) -> Result<T, BffError> {
      let e = match result {
         Ok(value) => return Ok(value),
         Err(e) => e,
      };

      if let Err(release_error) = self.schedules.release(user_id, date).await {
         tracing::warn!(
            error = %release_error,
            "claim の解放に失敗しました（タイムアウト後に再 claim されます）"
         );
      }
      log_business_event!(
         event.category = event::category::SCHEDULE,
         event.action = event::action::DAILY_SCHEDULE_GENERATED,
         event.entity_type = event::entity_type::SCHEDULE_GENERATION,
         event.entity_id = %date,
         event.user_id = %user_id,
         event.result = event::result::FAILURE,
         "スケジュールの生成に失敗"
      );
      Err(e)
   }

   async fn existing_day(&self, user_id: &UserId, date: NaiveDate) -> Result<DayRows, BffError> {
      let range = DateRange::between(date, date)?;
      Ok(DayRows {
         workouts: self.workouts.find_by_range(user_id, &range).await?,
         meals:    self.meals.find_by_range(user_id, &range).await?,
      })
   }

   /// 期間内の予定を日付ごとにまとめて返す
   pub async fn get(
      &self,
      user_id: &UserId,
      start_date: NaiveDate,
      end_date: NaiveDate,
   ) -> Result<Vec<ScheduledDay>, BffError> {
      let range = DateRange::between(start_date, end_date)?;
      let workouts = self.workouts.find_by_range(user_id, &range).await?;
      let meals = self.meals.find_by_range(user_id, &range).await?;
      Ok(group_by_date(workouts, meals))
   }

   pub async fn update_item(
      &self,
      user_id: &UserId,
      item_type: &str,
      item_id: Uuid,
      update: ItemUpdate,
   ) -> Result<ScheduleItem, BffError> {
      match item_type.parse::<ScheduleItemType>()? {
         ScheduleItemType::Workout => self
            .workout_items
            .update(user_id, &WorkoutId::from_uuid(item_id), update)
            .await
            .map(ScheduleItem::Workout),
         ScheduleItemType::Meal => self
            .meal_items
            .update(user_id, &MealId::from_uuid(item_id), update)
            .await
            .map(ScheduleItem::Meal),
      }
   }

   pub async fn delete_item(
      &self,
      user_id: &UserId,
      item_type: &str,
      item_id: Uuid,
   ) -> Result<ScheduleItemType, BffError> {
      let item_type = item_type.parse::<ScheduleItemType>()?;
      match item_type {
         ScheduleItemType::Workout => {
            self.workout_items
               .delete(user_id, &WorkoutId::from_uuid(item_id))
               .await?
         }
         ScheduleItemType::Meal => {
            self.meal_items
               .delete(user_id, &MealId::from_uuid(item_id))
               .await?
         }
      }
      Ok(item_type)
   }
}
