use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::runner::{ExperienceLevel, RaceDistance};
use super::structure::WorkoutStructure;
use super::workout::{TrainingPhase, WorkoutType};

/// Week counts of the four training phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub base_weeks: u32,
    pub build_weeks: u32,
    pub peak_weeks: u32,
    pub taper_weeks: u32,
}

impl PhaseDurations {
    /// 16 weeks, base heavy. Used when no row exists for a race and level.
    pub const FALLBACK: PhaseDurations = PhaseDurations {
        base_weeks: 6,
        build_weeks: 5,
        peak_weeks: 3,
        taper_weeks: 2,
    };

    pub fn total_weeks(&self) -> u32 {
        self.base_weeks + self.build_weeks + self.peak_weeks + self.taper_weeks
    }

    /// Phase of a 1-based week by cumulative boundary comparison.
    pub fn phase_for_week(&self, week: u32) -> TrainingPhase {
        if week <= self.base_weeks {
            TrainingPhase::Base
        } else if week <= self.base_weeks + self.build_weeks {
            TrainingPhase::Build
        } else if week <= self.base_weeks + self.build_weeks + self.peak_weeks {
            TrainingPhase::Peak
        } else {
            TrainingPhase::Taper
        }
    }

    pub fn weeks_in(&self, phase: TrainingPhase) -> u32 {
        match phase {
            TrainingPhase::Base => self.base_weeks,
            TrainingPhase::Build => self.build_weeks,
            TrainingPhase::Peak => self.peak_weeks,
            TrainingPhase::Taper => self.taper_weeks,
        }
    }

    /// First week of a phase and its length.
    pub fn phase_bounds(&self, phase: TrainingPhase) -> (u32, u32) {
        let preceding: u32 = TrainingPhase::ALL
            .iter()
            .take_while(|p| **p != phase)
            .map(|p| self.weeks_in(*p))
            .sum();
        (preceding + 1, self.weeks_in(phase))
    }

    /// Position of a week inside its phase, 1-based, with the phase length.
    pub fn position_in_phase(&self, week: u32) -> (u32, u32) {
        let phase = self.phase_for_week(week);
        let (first, length) = self.phase_bounds(phase);
        (week.saturating_sub(first) + 1, length)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDurationRecord {
    pub race_distance: RaceDistance,
    pub experience_level: ExperienceLevel,
    #[serde(flatten)]
    pub durations: PhaseDurations,
}

/// A curated workout structure, keyed by type, level, phase and race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureTemplate {
    pub id: i64,
    pub workout_type: WorkoutType,
    pub experience_level: ExperienceLevel,
    pub phase: TrainingPhase,
    pub race_distance: Option<RaceDistance>,
    pub structure: WorkoutStructure,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStructureTemplate {
    pub workout_type: WorkoutType,
    pub experience_level: ExperienceLevel,
    pub phase: TrainingPhase,
    pub race_distance: Option<RaceDistance>,
    pub structure: WorkoutStructure,
}

/// One weekday slot of a weekly pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySlot {
    pub day_of_week: Weekday,
    pub workout_type: WorkoutType,
    pub priority: i32,
}

impl WeeklySlot {
    /// Days after the start of a plan week; Sunday is 0.
    pub fn day_offset(&self) -> i64 {
        self.day_of_week.num_days_from_sunday() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyScheduleRow {
    pub training_days: i32,
    pub phase: TrainingPhase,
    #[serde(flatten)]
    pub slot: WeeklySlot,
}

/// Weekday from a Sunday-based index as stored in the database.
pub fn weekday_from_sunday_index(index: i32) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TemplateCounts {
    pub phase_durations: i64,
    pub structure_templates: i64,
    pub weekly_slots: i64,
}

impl TemplateCounts {
    pub fn is_empty(&self) -> bool {
        self.phase_durations == 0 && self.structure_templates == 0 && self.weekly_slots == 0
    }
}
