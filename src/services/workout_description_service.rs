//! Text and effective targets for a workout, derived from its structure.
//!
//! Everything here is a pure function of its arguments, so the schedule
//! read path can call it as often as it likes.

use crate::models::{DistanceUnit, Segment, WorkoutStructure, WorkoutType};

// Warmup and cooldown minutes per approximated kilometre.
const EASY_MINUTES_PER_KM: f64 = 10.0;
const DEFAULT_DISTANCE_KM: f64 = 3.0;
const DEFAULT_DURATION_MINUTES: f64 = 30.0;

/// Formats kilometre values in the runner's preferred unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitConverter {
    unit: DistanceUnit,
}

impl UnitConverter {
    pub fn new(unit: DistanceUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    pub fn convert(&self, km: f64) -> f64 {
        km / self.unit.km_factor()
    }

    /// One decimal and the unit label, e.g. `6.2 mi`.
    pub fn format_distance(&self, km: f64) -> String {
        format!("{:.1} {}", self.convert(km), self.unit.label())
    }
}

fn default_pace(workout_type: WorkoutType) -> &'static str {
    match workout_type {
        WorkoutType::Interval => "5K",
        WorkoutType::Tempo | WorkoutType::Hill => "threshold",
        WorkoutType::Recovery => "recovery",
        WorkoutType::Easy | WorkoutType::Long | WorkoutType::CrossTraining => "easy",
    }
}

fn run_label(workout_type: WorkoutType) -> Option<&'static str> {
    match workout_type {
        WorkoutType::Tempo => Some("tempo run"),
        WorkoutType::Easy => Some("easy run"),
        WorkoutType::Recovery => Some("recovery run"),
        WorkoutType::Long => Some("long run"),
        _ => None,
    }
}

/// Sentence used when no structure says anything better.
pub fn fallback_description(workout_type: WorkoutType) -> &'static str {
    match workout_type {
        WorkoutType::Easy => "Easy run at a relaxed, conversational pace",
        WorkoutType::Long => "Long run at a steady aerobic effort",
        WorkoutType::Tempo => "Tempo run at comfortably hard threshold effort",
        WorkoutType::Interval => "Fast repeats with easy jogging recovery between them",
        WorkoutType::Hill => "Hill repeats with an easy jog back down",
        WorkoutType::Recovery => "Short and very easy recovery run",
        WorkoutType::CrossTraining => "Low-impact cross-training such as cycling or swimming",
    }
}

fn rest_clause(rest_seconds: Option<f64>, noun: &str) -> String {
    match rest_seconds {
        Some(rest) => format!(" with {}s {}", rest.round() as i64, noun),
        None => String::new(),
    }
}

/// Human readable summary of a workout.
///
/// `distance_override_km` replaces the distance a structure carries, so a
/// progressive target can be shown instead of the template's base value.
/// Rules, first match wins:
///
/// - interval set: `6x400m @ 5K pace with 90s rest`
/// - multi-segment long run: `18.0 km long run with varied pace segments`
/// - tempo, easy, recovery or long with a distance: `8.0 km tempo run @ threshold pace`
/// - timed hill set: `8x60s hill repeats @ hard effort with 90s recovery`
/// - the structure's own description
/// - [`fallback_description`]
pub fn describe(
    workout_type: WorkoutType,
    structure: Option<&WorkoutStructure>,
    units: &UnitConverter,
    distance_override_km: Option<f64>,
) -> String {
    let Some(structure) = structure else {
        return fallback_description(workout_type).to_string();
    };

    match workout_type {
        WorkoutType::Interval => {
            if let Some((set, km)) = structure.interval_set() {
                let pace = set.pace.as_deref().unwrap_or(default_pace(workout_type));
                return format!(
                    "{}x{}m @ {} pace{}",
                    set.reps,
                    (km * 1000.0).round() as i64,
                    pace,
                    rest_clause(set.rest_seconds, "rest")
                );
            }
        }
        WorkoutType::Long if structure.is_multi_segment() => {
            let km = distance_override_km.unwrap_or_else(|| calculate_distance(Some(structure), None, None, None));
            return format!("{} long run with varied pace segments", units.format_distance(km));
        }
        WorkoutType::Hill => {
            if let Some((set, secs)) = structure.timed_set() {
                let effort = set.effort.as_deref().unwrap_or("hard");
                return format!(
                    "{}x{}s hill repeats @ {} effort{}",
                    set.reps,
                    secs.round() as i64,
                    effort,
                    rest_clause(set.rest_seconds, "recovery")
                );
            }
        }
        _ => {}
    }

    if let (Some(label), Some(segment)) = (run_label(workout_type), structure.lead_segment()) {
        if let Some(km) = segment.distance_km {
            let pace = segment.pace.as_deref().unwrap_or(default_pace(workout_type));
            let shown = distance_override_km.unwrap_or(km);
            return format!("{} {} @ {} pace", units.format_distance(shown), label, pace);
        }
    }

    structure
        .description
        .clone()
        .unwrap_or_else(|| fallback_description(workout_type).to_string())
}

/// Effective distance in kilometres.
///
/// With both distance bounds and the week's position in its phase known,
/// the distance climbs linearly from `min_distance` in the first week of the
/// phase to `max_distance` in the last.
///
/// Interval sessions add their warmup and cooldown, whose `duration` is in
/// minutes, at an easy 10 minutes per km: `easy_minutes / 10` kilometres.
pub fn calculate_distance(
    structure: Option<&WorkoutStructure>,
    base_distance_km: Option<f64>,
    week_in_phase: Option<u32>,
    total_phase_weeks: Option<u32>,
) -> f64 {
    let base = base_distance_km.unwrap_or(DEFAULT_DISTANCE_KM);
    let Some(structure) = structure else {
        return base;
    };

    if let Some(min) = structure.min_distance {
        return match (structure.max_distance, week_in_phase, total_phase_weeks) {
            (Some(max), Some(week), Some(total)) if total > 1 => {
                let step = (week.clamp(1, total) - 1) as f64 / (total - 1) as f64;
                min + (max - min) * step
            }
            _ => min,
        };
    }

    let main_km: f64 = structure.main.iter().map(Segment::distance_km).sum();

    if structure.interval_set().is_some() {
        return main_km + structure.easy_minutes() / EASY_MINUTES_PER_KM;
    }

    if structure.is_multi_segment() && main_km > 0.0 {
        return main_km;
    }

    match structure.lead_segment().and_then(|segment| segment.distance_km) {
        Some(km) => km,
        None => base,
    }
}

/// Effective duration in minutes.
pub fn calculate_duration(structure: Option<&WorkoutStructure>, base_duration_minutes: Option<f64>) -> f64 {
    let base = base_duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    let Some(structure) = structure else {
        return base;
    };

    if let Some(min) = structure.min_duration {
        return min;
    }

    let work: f64 = structure.main.iter().map(Segment::work_minutes).sum();
    let total = structure.easy_minutes() + work;
    if total > 0.0 {
        total
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn structure(value: serde_json::Value) -> WorkoutStructure {
        WorkoutStructure::from_value(value).unwrap()
    }

    fn km() -> UnitConverter {
        UnitConverter::new(DistanceUnit::Km)
    }

    #[test]
    fn interval_text_uses_metres_and_rest() {
        let s = structure(json!({"reps": 6, "distance": 0.4, "rest": 90, "pace": "5K"}));
        assert_eq!(describe(WorkoutType::Interval, Some(&s), &km(), None), "6x400m @ 5K pace with 90s rest");
    }

    #[test]
    fn interval_without_rest_omits_clause() {
        let s = structure(json!({"reps": 4, "distance": 1.0}));
        assert_eq!(describe(WorkoutType::Interval, Some(&s), &km(), None), "4x1000m @ 5K pace");
    }

    #[test]
    fn distance_runs_use_preferred_unit() {
        let s = structure(json!({"distance": 8.0, "pace": "threshold"}));
        assert_eq!(describe(WorkoutType::Tempo, Some(&s), &km(), None), "8.0 km tempo run @ threshold pace");
        assert_eq!(
            describe(WorkoutType::Tempo, Some(&s), &UnitConverter::new(DistanceUnit::Mi), None),
            "5.0 mi tempo run @ threshold pace"
        );
        assert_eq!(
            describe(WorkoutType::Easy, Some(&structure(json!({"distance": 5.0}))), &km(), Some(6.5)),
            "6.5 km easy run @ easy pace"
        );
    }

    #[test]
    fn multi_segment_long_run_is_generic() {
        let s = structure(json!({
            "main": [{"segments": [{"distance": 12.0, "pace": "easy"}, {"distance": 4.0, "pace": "marathon"}]}]
        }));
        assert_eq!(
            describe(WorkoutType::Long, Some(&s), &km(), None),
            "16.0 km long run with varied pace segments"
        );
    }

    #[test]
    fn hill_repeats_report_effort() {
        let s = structure(json!({"main": [{"reps": 8, "duration": 60, "rest": 90, "effort": "hard"}]}));
        assert_eq!(
            describe(WorkoutType::Hill, Some(&s), &km(), None),
            "8x60s hill repeats @ hard effort with 90s recovery"
        );
    }

    #[test]
    fn falls_back_to_structure_description_then_type_sentence() {
        let s = structure(json!({"description": "Fartlek by feel", "minDuration": 40}));
        assert_eq!(describe(WorkoutType::Interval, Some(&s), &km(), None), "Fartlek by feel");
        assert_eq!(
            describe(WorkoutType::Recovery, None, &km(), None),
            fallback_description(WorkoutType::Recovery)
        );
    }

    #[test]
    fn interval_distance_adds_reps_and_easy_blocks() {
        let s = structure(json!({"reps": 6, "distance": 0.25, "rest": 90}));
        assert_eq!(calculate_distance(Some(&s), Some(4.0), None, None), 1.5);

        let with_blocks = structure(json!({
            "warmup": {"duration": 15}, "cooldown": {"duration": 10},
            "main": [{"reps": 6, "distance": 0.4, "rest": 90}]
        }));
        let distance = calculate_distance(Some(&with_blocks), Some(4.0), None, None);
        assert!((distance - (2.4 + 2.5)).abs() < 1e-9);
    }

    #[test]
    fn easy_block_minutes_convert_at_ten_per_km() {
        let warmup_only = structure(json!({
            "warmup": {"duration": 20},
            "main": [{"reps": 4, "distance": 1.0, "rest": 120}]
        }));
        assert_eq!(calculate_distance(Some(&warmup_only), None, None, None), 4.0 + 2.0);
    }

    #[test]
    fn min_distance_progresses_through_phase() {
        let s = structure(json!({"distance": 14.0, "minDistance": 14.0, "maxDistance": 20.0}));
        assert_eq!(calculate_distance(Some(&s), None, Some(1), Some(4)), 14.0);
        assert_eq!(calculate_distance(Some(&s), None, Some(4), Some(4)), 20.0);
        assert_eq!(calculate_distance(Some(&s), None, Some(3), Some(4)), 18.0);
        assert_eq!(calculate_distance(Some(&s), None, None, None), 14.0);
        assert_eq!(calculate_distance(Some(&s), None, Some(1), Some(1)), 14.0);
    }

    #[test]
    fn distance_defaults() {
        assert_eq!(calculate_distance(None, None, None, None), 3.0);
        assert_eq!(calculate_distance(None, Some(7.0), None, None), 7.0);
        let description_only = structure(json!({"description": "Easy miles"}));
        assert_eq!(calculate_distance(Some(&description_only), Some(5.0), None, None), 5.0);
        let single = structure(json!({"distance": 6.0}));
        assert_eq!(calculate_distance(Some(&single), Some(5.0), None, None), 6.0);
    }

    #[test]
    fn duration_sums_blocks_and_timed_work() {
        let s = structure(json!({
            "warmup": {"duration": 15}, "cooldown": {"duration": 10},
            "main": [{"reps": 8, "duration": 60, "rest": 90}]
        }));
        // 15 + 10 + 8 min of work + 7 × 1.5 min of rest
        assert_eq!(calculate_duration(Some(&s), None), 43.5);

        let plain = structure(json!({"duration": 25, "effort": "very easy"}));
        assert_eq!(calculate_duration(Some(&plain), Some(40.0)), 25.0);

        let bounded = structure(json!({"minDuration": 30, "description": "Aerobic"}));
        assert_eq!(calculate_duration(Some(&bounded), Some(45.0)), 30.0);

        assert_eq!(calculate_duration(None, None), 30.0);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let s = structure(json!({"warmup": {"duration": 10}, "main": [{"reps": 5, "distance": 1.0, "rest": 120}]}));
        let units = km();
        let first = (
            describe(WorkoutType::Interval, Some(&s), &units, None),
            calculate_distance(Some(&s), Some(5.0), Some(2), Some(3)),
            calculate_duration(Some(&s), Some(45.0)),
        );
        let second = (
            describe(WorkoutType::Interval, Some(&s), &units, None),
            calculate_distance(Some(&s), Some(5.0), Some(2), Some(3)),
            calculate_duration(Some(&s), Some(45.0)),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn converter_formats_one_decimal() {
        let miles = UnitConverter::new(DistanceUnit::Mi);
        assert_eq!(miles.format_distance(10.0), "6.2 mi");
        assert_eq!(km().format_distance(5.0), "5.0 km");
    }
}
