use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::structure::WorkoutStructure;

/// A single dated workout inside a training plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub date: NaiveDate,
    pub week_number: i32,
    pub phase: TrainingPhase,
    pub workout_type: WorkoutType,
    pub intensity: Intensity,
    pub distance_target_km: Option<f64>,
    pub duration_minutes: Option<i32>,
    pub pace_target: Option<String>,
    pub status: WorkoutStatus,
    pub structure_ref: Option<i64>, // workout_structure_templates.id
    pub structure_json: Option<WorkoutStructure>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "training_phase", rename_all = "snake_case")]
pub enum TrainingPhase {
    Base,
    Build,
    Peak,
    Taper,
}

impl TrainingPhase {
    pub const ALL: [TrainingPhase; 4] = [
        TrainingPhase::Base,
        TrainingPhase::Build,
        TrainingPhase::Peak,
        TrainingPhase::Taper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingPhase::Base => "Base",
            TrainingPhase::Build => "Build",
            TrainingPhase::Peak => "Peak",
            TrainingPhase::Taper => "Taper",
        }
    }
}

impl fmt::Display for TrainingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrainingPhase::ALL
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown training phase '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workout_type", rename_all = "snake_case")]
pub enum WorkoutType {
    Easy,
    Long,
    Tempo,
    Interval,
    Hill,
    Recovery,
    #[serde(rename = "Cross-training")]
    CrossTraining,
}

impl WorkoutType {
    pub const ALL: [WorkoutType; 7] = [
        WorkoutType::Easy,
        WorkoutType::Long,
        WorkoutType::Tempo,
        WorkoutType::Interval,
        WorkoutType::Hill,
        WorkoutType::Recovery,
        WorkoutType::CrossTraining,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Easy => "Easy",
            WorkoutType::Long => "Long",
            WorkoutType::Tempo => "Tempo",
            WorkoutType::Interval => "Interval",
            WorkoutType::Hill => "Hill",
            WorkoutType::Recovery => "Recovery",
            WorkoutType::CrossTraining => "Cross-training",
        }
    }

    /// Fixed type to intensity mapping used when a workout is generated.
    pub fn intensity(&self) -> Intensity {
        match self {
            WorkoutType::Easy | WorkoutType::Recovery | WorkoutType::CrossTraining => Intensity::Low,
            WorkoutType::Tempo | WorkoutType::Hill => Intensity::Moderate,
            WorkoutType::Long | WorkoutType::Interval => Intensity::High,
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "easy" => Ok(WorkoutType::Easy),
            "long" => Ok(WorkoutType::Long),
            "tempo" => Ok(WorkoutType::Tempo),
            "interval" | "intervals" => Ok(WorkoutType::Interval),
            "hill" | "hills" => Ok(WorkoutType::Hill),
            "recovery" => Ok(WorkoutType::Recovery),
            "cross-training" | "crosstraining" => Ok(WorkoutType::CrossTraining),
            _ => Err(format!("unknown workout type '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workout_intensity", rename_all = "snake_case")]
pub enum Intensity {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workout_status", rename_all = "snake_case")]
pub enum WorkoutStatus {
    #[default]
    Pending,
    Completed,
    Skipped,
}

/// Runner marks a workout completed or skipped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWorkoutStatus {
    pub status: WorkoutStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensity_mapping_matches_workout_families() {
        assert_eq!(WorkoutType::Easy.intensity(), Intensity::Low);
        assert_eq!(WorkoutType::Recovery.intensity(), Intensity::Low);
        assert_eq!(WorkoutType::CrossTraining.intensity(), Intensity::Low);
        assert_eq!(WorkoutType::Tempo.intensity(), Intensity::Moderate);
        assert_eq!(WorkoutType::Hill.intensity(), Intensity::Moderate);
        assert_eq!(WorkoutType::Long.intensity(), Intensity::High);
        assert_eq!(WorkoutType::Interval.intensity(), Intensity::High);
    }

    #[test]
    fn workout_type_parses_loose_spellings() {
        assert_eq!("cross_training".parse::<WorkoutType>(), Ok(WorkoutType::CrossTraining));
        assert_eq!("Cross-training".parse::<WorkoutType>(), Ok(WorkoutType::CrossTraining));
        assert_eq!("Intervals".parse::<WorkoutType>(), Ok(WorkoutType::Interval));
        assert!("swim".parse::<WorkoutType>().is_err());
    }

    #[test]
    fn cross_training_serializes_with_hyphen() {
        let json = serde_json::to_string(&WorkoutType::CrossTraining).unwrap();
        assert_eq!(json, "\"Cross-training\"");
    }
}
