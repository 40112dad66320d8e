use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::runner::{ExperienceLevel, RaceDistance};
use super::templates::PhaseDurations;
use super::workout::{TrainingPhase, WorkoutType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub id: Uuid,
    pub runner_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub race_type: RaceDistance,
    pub experience_level: ExperienceLevel,
    pub training_days: i32,
    pub start_date: NaiveDate,
    pub race_date: NaiveDate,
    pub status: PlanStatus,
    pub plan_metadata: PlanMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "plan_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Archived,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub total_weeks: u32,
    pub base_weeks: u32,
    pub build_weeks: u32,
    pub peak_weeks: u32,
    pub taper_weeks: u32,
}

impl PlanMetadata {
    pub fn phase_durations(&self) -> PhaseDurations {
        PhaseDurations {
            base_weeks: self.base_weeks,
            build_weeks: self.build_weeks,
            peak_weeks: self.peak_weeks,
            taper_weeks: self.taper_weeks,
        }
    }
}

impl From<PhaseDurations> for PlanMetadata {
    fn from(durations: PhaseDurations) -> Self {
        Self {
            total_weeks: durations.total_weeks(),
            base_weeks: durations.base_weeks,
            build_weeks: durations.build_weeks,
            peak_weeks: durations.peak_weeks,
            taper_weeks: durations.taper_weeks,
        }
    }
}

/// Inputs of a plan generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanGenerationRequest {
    pub runner_id: Uuid,
    pub race_type: RaceDistance,
    pub experience_level: ExperienceLevel,
    pub fitness_score: f64,
    pub training_days: i32,
    pub race_date: NaiveDate,
    pub start_date: NaiveDate,
    pub plan_name: Option<String>,
    pub plan_description: Option<String>,
    /// Regenerate this plan instead of creating a new one.
    pub plan_id: Option<Uuid>,
}

/// Request body of the generation endpoints; the runner and plan come from the path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePlanBody {
    pub race_type: RaceDistance,
    pub experience_level: ExperienceLevel,
    pub fitness_score: f64,
    pub training_days: i32,
    pub race_date: NaiveDate,
    pub start_date: NaiveDate,
    pub plan_name: Option<String>,
    pub plan_description: Option<String>,
}

impl GeneratePlanBody {
    pub fn into_request(self, runner_id: Uuid, plan_id: Option<Uuid>) -> PlanGenerationRequest {
        PlanGenerationRequest {
            runner_id,
            race_type: self.race_type,
            experience_level: self.experience_level,
            fitness_score: self.fitness_score,
            training_days: self.training_days,
            race_date: self.race_date,
            start_date: self.start_date,
            plan_name: self.plan_name,
            plan_description: self.plan_description,
            plan_id,
        }
    }
}

/// A (type, level, phase, race) tuple with no usable structure template
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateGap {
    pub workout_type: WorkoutType,
    pub experience_level: ExperienceLevel,
    pub phase: TrainingPhase,
    pub race_distance: RaceDistance,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub plan_id: Uuid,
    pub regenerated: bool,
    pub total_weeks: u32,
    pub workouts_created: usize,
    pub template_gaps: Vec<TemplateGap>,
}
