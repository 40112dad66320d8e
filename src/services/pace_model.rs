//! Training paces from a fitness score.
//!
//! The score is VDOT-like. Each pace category scales it by a fixed
//! multiplier, evaluates the velocity curve
//!
//! ```text
//! v = 29.54 + 5.000663·s − 0.007546·s²      (metres per minute)
//! ```
//!
//! and expresses the result as a fraction of a day per kilometre:
//! `pace = (1 / v) · K / 1440`. `K` is 1000 for interval and tempo and
//! 1000.344 for easy running. These are calibration constants and must stay
//! exactly as they are for output compatibility.
//!
//! The curve peaks near `s ≈ 331`, so paces are strictly decreasing in the
//! fitness score up to [`MONOTONIC_FITNESS_LIMIT`].

use serde::Serialize;

use crate::models::{DistanceUnit, WorkoutType};

const VELOCITY_INTERCEPT: f64 = 29.54;
const VELOCITY_LINEAR: f64 = 5.000663;
const VELOCITY_QUADRATIC: f64 = 0.007546;

const INTERVAL_MULTIPLIER: f64 = 1.05;
const TEMPO_MULTIPLIER: f64 = 0.94;
const EASY_MULTIPLIER: f64 = 0.59 + 0.41 * (0.8 - 0.65) / 0.35;

const METRES_PER_KM: f64 = 1000.0;
const EASY_METRES_PER_KM: f64 = 1000.344;
const MINUTES_PER_DAY: f64 = 1440.0;

/// Highest fitness score for which every pace still improves with fitness.
pub const MONOTONIC_FITNESS_LIMIT: f64 = 315.0;

/// Paces in fractions of a day per kilometre
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingPaces {
    pub interval: f64,
    pub tempo: f64,
    pub easy: f64,
}

/// Paces rendered for one distance unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaceDisplay {
    pub unit: DistanceUnit,
    pub interval: String,
    pub tempo: String,
    pub easy: String,
}

/// Velocity in metres per minute for a scaled score.
fn velocity(scaled: f64) -> f64 {
    VELOCITY_INTERCEPT + VELOCITY_LINEAR * scaled - VELOCITY_QUADRATIC * scaled * scaled
}

fn pace_at(fitness_score: f64, multiplier: f64, metres_per_km: f64) -> Option<f64> {
    let v = velocity(fitness_score * multiplier);
    if !v.is_finite() || v <= 0.0 {
        return None;
    }
    Some((1.0 / v) * metres_per_km / MINUTES_PER_DAY)
}

/// Interval, tempo and easy paces for a fitness score.
///
/// Returns `None` when the score is not a positive finite number, or so large
/// that the velocity curve has turned negative.
///
/// ```rust,ignore
/// let paces = compute_paces(50.0).unwrap();
/// assert!(paces.interval < paces.tempo && paces.tempo < paces.easy);
/// ```
pub fn compute_paces(fitness_score: f64) -> Option<TrainingPaces> {
    if !fitness_score.is_finite() || fitness_score <= 0.0 {
        return None;
    }

    Some(TrainingPaces {
        interval: pace_at(fitness_score, INTERVAL_MULTIPLIER, METRES_PER_KM)?,
        tempo: pace_at(fitness_score, TEMPO_MULTIPLIER, METRES_PER_KM)?,
        easy: pace_at(fitness_score, EASY_MULTIPLIER, EASY_METRES_PER_KM)?,
    })
}

/// Format a fraction-of-a-day pace as `m:ss /km` or `m:ss /mi`.
///
/// Minutes are floored and the remaining seconds rounded; a remainder that
/// rounds to 60 carries into the minute.
pub fn format_pace(pace: f64, unit: DistanceUnit) -> String {
    let total_minutes = pace * MINUTES_PER_DAY * unit.km_factor();
    let mut minutes = total_minutes.floor() as i64;
    let mut seconds = ((total_minutes - minutes as f64) * 60.0).round() as i64;
    if seconds >= 60 {
        minutes += 1;
        seconds -= 60;
    }
    format!("{}:{:02} /{}", minutes, seconds, unit.label())
}

/// The pace category that drives a workout type. Cross-training has none.
pub fn pace_for_workout(paces: &TrainingPaces, workout_type: WorkoutType) -> Option<f64> {
    match workout_type {
        WorkoutType::Interval => Some(paces.interval),
        WorkoutType::Tempo | WorkoutType::Hill => Some(paces.tempo),
        WorkoutType::Easy | WorkoutType::Long | WorkoutType::Recovery => Some(paces.easy),
        WorkoutType::CrossTraining => None,
    }
}

impl TrainingPaces {
    pub fn display(&self, unit: DistanceUnit) -> PaceDisplay {
        PaceDisplay {
            unit,
            interval: format_pace(self.interval, unit),
            tempo: format_pace(self.tempo, unit),
            easy: format_pace(self.easy, unit),
        }
    }
}
