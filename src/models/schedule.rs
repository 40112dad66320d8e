use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::runner::DistanceUnit;
use super::training_plan::TrainingPlan;
use super::workout::{Intensity, TrainingPhase, WorkoutStatus, WorkoutType};

/// A workout rendered for display: progressive distance, live pace, text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutView {
    pub id: Uuid,
    pub date: NaiveDate,
    pub week_number: i32,
    pub phase: TrainingPhase,
    pub workout_type: WorkoutType,
    pub intensity: Intensity,
    pub status: WorkoutStatus,
    pub description: String,
    pub distance_km: f64,
    pub distance_display: String,
    pub duration_minutes: f64,
    pub pace_target: Option<String>,
    pub personalized_pace: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub week_number: i32,
    pub phase: TrainingPhase,
    pub workouts: usize,
    pub completed: usize,
    pub total_distance_km: f64,
    pub total_duration_minutes: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSchedule {
    pub plan: TrainingPlan,
    pub unit: DistanceUnit,
    pub weeks: Vec<WeekSummary>,
    pub workouts: Vec<WorkoutView>,
}
