use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Runner profile as maintained by the profile forms upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerProfile {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub experience_level: ExperienceLevel,
    pub race_goal: Option<RaceDistance>,
    pub fitness_score: f64, // VDOT-like
    pub training_days_per_week: i32,
    pub race_date: Option<NaiveDate>,
    pub training_start_date: Option<NaiveDate>,
    pub preferred_unit: DistanceUnit,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "experience_level", rename_all = "snake_case")]
pub enum ExperienceLevel {
    Novice,
    Recreational,
    Competitive,
    Elite,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [
        ExperienceLevel::Novice,
        ExperienceLevel::Recreational,
        ExperienceLevel::Competitive,
        ExperienceLevel::Elite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Novice => "Novice",
            ExperienceLevel::Recreational => "Recreational",
            ExperienceLevel::Competitive => "Competitive",
            ExperienceLevel::Elite => "Elite",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExperienceLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown experience level '{}'", s))
    }
}

/// Target race distance of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "race_distance")]
pub enum RaceDistance {
    #[serde(rename = "5K")]
    #[sqlx(rename = "5k")]
    FiveK,
    #[serde(rename = "10K")]
    #[sqlx(rename = "10k")]
    TenK,
    #[serde(rename = "Half Marathon")]
    #[sqlx(rename = "half_marathon")]
    HalfMarathon,
    #[serde(rename = "Marathon")]
    #[sqlx(rename = "marathon")]
    Marathon,
}

impl RaceDistance {
    pub const ALL: [RaceDistance; 4] = [
        RaceDistance::FiveK,
        RaceDistance::TenK,
        RaceDistance::HalfMarathon,
        RaceDistance::Marathon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RaceDistance::FiveK => "5K",
            RaceDistance::TenK => "10K",
            RaceDistance::HalfMarathon => "Half Marathon",
            RaceDistance::Marathon => "Marathon",
        }
    }
}

impl fmt::Display for RaceDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RaceDistance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "5k" => Ok(RaceDistance::FiveK),
            "10k" => Ok(RaceDistance::TenK),
            "half marathon" | "half" => Ok(RaceDistance::HalfMarathon),
            "marathon" => Ok(RaceDistance::Marathon),
            _ => Err(format!("unknown race distance '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "distance_unit", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Km,
    Mi,
}

impl DistanceUnit {
    pub const KM_PER_MILE: f64 = 1.609344;

    pub fn label(&self) -> &'static str {
        match self {
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
        }
    }

    /// Kilometres in one unit.
    pub fn km_factor(&self) -> f64 {
        match self {
            DistanceUnit::Km => 1.0,
            DistanceUnit::Mi => Self::KM_PER_MILE,
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "km" | "kilometers" | "kilometres" => Ok(DistanceUnit::Km),
            "mi" | "miles" => Ok(DistanceUnit::Mi),
            _ => Err(format!("unknown distance unit '{}'", s)),
        }
    }
}

/// Create or replace a runner profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertRunnerProfile {
    pub display_name: Option<String>,
    pub experience_level: ExperienceLevel,
    pub race_goal: Option<RaceDistance>,
    pub fitness_score: f64,
    pub training_days_per_week: i32,
    pub race_date: Option<NaiveDate>,
    pub training_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub preferred_unit: DistanceUnit,
}

impl UpsertRunnerProfile {
    pub fn into_profile(self, id: Uuid) -> RunnerProfile {
        let now = Utc::now();
        RunnerProfile {
            id,
            display_name: self.display_name,
            experience_level: self.experience_level,
            race_goal: self.race_goal,
            fitness_score: self.fitness_score,
            training_days_per_week: self.training_days_per_week,
            race_date: self.race_date,
            training_start_date: self.training_start_date,
            preferred_unit: self.preferred_unit,
            created_at: now,
            updated_at: now,
        }
    }
}
