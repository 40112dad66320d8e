//! Persistence seams for the planning engine.
//!
//! Services only talk to [`TemplateRepository`] and [`PlanRepository`].
//! [`PgStore`] is the production implementation, [`InMemoryStore`] backs
//! tests and local runs without a database. Compound writes
//! (`save_generated_plan`, `replace_generated_plan`, `activate_plan`,
//! `delete_plan`) are atomic in both: a reader sees either the old state or
//! the new one.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ExperienceLevel, NewStructureTemplate, PhaseDurationRecord, PhaseDurations, PlanStatus,
    RaceDistance, RunnerProfile, StructureTemplate, TemplateCounts, TrainingPhase, TrainingPlan,
    WeeklyScheduleRow, WeeklySlot, Workout, WorkoutStatus, WorkoutType,
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[cfg(test)]
use mockall::automock;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Malformed template {key}: {reason}")]
    MalformedTemplate { key: String, reason: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Read-mostly template tables curated by admins
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn phase_durations(
        &self,
        race: RaceDistance,
        level: ExperienceLevel,
    ) -> Result<Option<PhaseDurations>, StoreError>;

    /// Every template matching the key. `race = None` leaves the race unconstrained.
    async fn structure_templates(
        &self,
        workout_type: WorkoutType,
        level: ExperienceLevel,
        phase: TrainingPhase,
        race: Option<RaceDistance>,
    ) -> Result<Vec<StructureTemplate>, StoreError>;

    /// Slots ordered by priority ascending, then weekday.
    async fn weekly_schedule(
        &self,
        training_days: i32,
        phase: TrainingPhase,
    ) -> Result<Vec<WeeklySlot>, StoreError>;

    async fn upsert_phase_durations(&self, record: &PhaseDurationRecord) -> Result<(), StoreError>;

    async fn insert_structure_template(
        &self,
        template: &NewStructureTemplate,
    ) -> Result<StructureTemplate, StoreError>;

    async fn insert_weekly_slot(&self, row: &WeeklyScheduleRow) -> Result<(), StoreError>;

    async fn template_counts(&self) -> Result<TemplateCounts, StoreError>;
}

/// Runners, plans and their workouts
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn get_runner(&self, runner_id: Uuid) -> Result<Option<RunnerProfile>, StoreError>;

    async fn upsert_runner(&self, runner: &RunnerProfile) -> Result<(), StoreError>;

    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<TrainingPlan>, StoreError>;

    async fn list_plans(&self, runner_id: Uuid) -> Result<Vec<TrainingPlan>, StoreError>;

    async fn active_plan(&self, runner_id: Uuid) -> Result<Option<TrainingPlan>, StoreError>;

    /// Insert a new plan with its workouts in one transaction.
    /// An active plan archives the runner's other active plans in the same transaction.
    async fn save_generated_plan(
        &self,
        plan: &TrainingPlan,
        workouts: &[Workout],
    ) -> Result<(), StoreError>;

    /// Refresh an existing plan's definition and replace all of its workouts
    /// in one transaction. The stored status and `created_at` are kept as they
    /// are at write time. Returns false, writing nothing, when the plan no
    /// longer exists for `plan.runner_id`.
    async fn replace_generated_plan(
        &self,
        plan: &TrainingPlan,
        workouts: &[Workout],
    ) -> Result<bool, StoreError>;

    /// Workouts of a plan ordered by date.
    async fn list_workouts(&self, plan_id: Uuid) -> Result<Vec<Workout>, StoreError>;

    async fn update_workout_status(
        &self,
        workout_id: Uuid,
        status: WorkoutStatus,
    ) -> Result<Option<Workout>, StoreError>;

    /// Archive the runner's other active plans and activate this one, atomically.
    async fn activate_plan(&self, runner_id: Uuid, plan_id: Uuid) -> Result<bool, StoreError>;

    async fn set_plan_status(&self, plan_id: Uuid, status: PlanStatus) -> Result<bool, StoreError>;

    /// Delete the plan's workouts, then the plan.
    async fn delete_plan(&self, plan_id: Uuid) -> Result<bool, StoreError>;
}
