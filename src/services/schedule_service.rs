use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{PlanError, PlanResult};
use crate::models::{PlanSchedule, PhaseDurations, WeekSummary, Workout, WorkoutStatus, WorkoutType, WorkoutView};
use crate::repository::PlanRepository;

use super::pace_model::{compute_paces, format_pace, pace_for_workout, TrainingPaces};
use super::workout_description_service::{calculate_distance, calculate_duration, describe, UnitConverter};

/// Renders stored plans for display
#[derive(Clone)]
pub struct ScheduleService {
    plans: Arc<dyn PlanRepository>,
}

impl ScheduleService {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    /// The plan with every workout rendered in the runner's unit and pace,
    /// plus per-week totals.
    pub async fn plan_schedule(&self, plan_id: Uuid) -> PlanResult<PlanSchedule> {
        let plan = self
            .plans
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| PlanError::not_found(format!("plan {}", plan_id)))?;
        let runner = self.plans.get_runner(plan.runner_id).await?;
        let workouts = self.plans.list_workouts(plan_id).await?;

        let unit = runner.as_ref().map(|r| r.preferred_unit).unwrap_or_default();
        let units = UnitConverter::new(unit);
        let paces = runner.as_ref().and_then(|r| compute_paces(r.fitness_score));
        let durations = plan.plan_metadata.phase_durations();

        let views: Vec<WorkoutView> = workouts
            .iter()
            .map(|workout| render_workout(workout, durations, &units, paces.as_ref()))
            .collect();

        Ok(PlanSchedule {
            weeks: summarize_weeks(&views),
            plan,
            unit,
            workouts: views,
        })
    }
}

fn render_workout(
    workout: &Workout,
    durations: PhaseDurations,
    units: &UnitConverter,
    paces: Option<&TrainingPaces>,
) -> WorkoutView {
    let structure = workout.structure_json.as_ref();
    let week = u32::try_from(workout.week_number).unwrap_or(1);
    let (week_in_phase, phase_weeks) = durations.position_in_phase(week);

    let distance_km = match workout.workout_type {
        WorkoutType::CrossTraining => 0.0,
        _ => calculate_distance(structure, workout.distance_target_km, Some(week_in_phase), Some(phase_weeks)),
    };
    let duration_minutes = calculate_duration(structure, workout.duration_minutes.map(f64::from));
    let personalized_pace = paces
        .and_then(|p| pace_for_workout(p, workout.workout_type))
        .map(|pace| format_pace(pace, units.unit()));

    WorkoutView {
        id: workout.id,
        date: workout.date,
        week_number: workout.week_number,
        phase: workout.phase,
        workout_type: workout.workout_type,
        intensity: workout.intensity,
        status: workout.status,
        description: describe(workout.workout_type, structure, units, Some(distance_km)),
        distance_km,
        distance_display: units.format_distance(distance_km),
        duration_minutes,
        pace_target: workout.pace_target.clone(),
        personalized_pace,
        notes: workout.notes.clone(),
    }
}

fn summarize_weeks(views: &[WorkoutView]) -> Vec<WeekSummary> {
    let mut weeks: BTreeMap<i32, WeekSummary> = BTreeMap::new();
    for view in views {
        let summary = weeks.entry(view.week_number).or_insert_with(|| WeekSummary {
            week_number: view.week_number,
            phase: view.phase,
            workouts: 0,
            completed: 0,
            total_distance_km: 0.0,
            total_duration_minutes: 0.0,
        });
        summary.workouts += 1;
        if view.status == WorkoutStatus::Completed {
            summary.completed += 1;
        }
        summary.total_distance_km += view.distance_km;
        summary.total_duration_minutes += view.duration_minutes;
    }
    weeks.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DistanceUnit, Intensity, TrainingPhase, WorkoutStructure};
    use chrono::{NaiveDate, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn workout(week: i32, workout_type: WorkoutType, structure: Option<WorkoutStructure>) -> Workout {
        Workout {
            id: Uuid::new_v4(),
            plan_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap() + chrono::Duration::days((week as i64 - 1) * 7),
            week_number: week,
            phase: TrainingPhase::Build,
            workout_type,
            intensity: workout_type.intensity(),
            distance_target_km: Some(14.0),
            duration_minutes: Some(90),
            pace_target: None,
            status: WorkoutStatus::Pending,
            structure_ref: None,
            structure_json: structure,
            description: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn durations() -> PhaseDurations {
        PhaseDurations { base_weeks: 2, build_weeks: 3, peak_weeks: 1, taper_weeks: 1 }
    }

    #[test]
    fn long_run_distance_climbs_through_the_phase() {
        let structure = WorkoutStructure::from_value(json!({
            "main": [{"distance": 14.0, "pace": "easy"}], "minDistance": 14.0, "maxDistance": 18.0
        }))
        .unwrap();
        let units = UnitConverter::new(DistanceUnit::Km);
        let first = render_workout(&workout(3, WorkoutType::Long, Some(structure.clone())), durations(), &units, None);
        let last = render_workout(&workout(5, WorkoutType::Long, Some(structure)), durations(), &units, None);

        assert_eq!(first.distance_km, 14.0);
        assert_eq!(last.distance_km, 18.0);
        assert_eq!(last.description, "18.0 km long run @ easy pace");
        assert_eq!(last.intensity, Intensity::High);
    }

    #[test]
    fn personalized_pace_follows_runner_unit() {
        let paces = compute_paces(50.0).unwrap();
        let units = UnitConverter::new(DistanceUnit::Mi);
        let view = render_workout(&workout(1, WorkoutType::Tempo, None), durations(), &units, Some(&paces));

        assert_eq!(view.personalized_pace, Some(format_pace(paces.tempo, DistanceUnit::Mi)));
        assert_eq!(view.distance_display, "8.7 mi");
        assert_eq!(view.duration_minutes, 90.0);
    }

    #[test]
    fn weeks_are_summarized_in_order() {
        let units = UnitConverter::new(DistanceUnit::Km);
        let mut done = workout(1, WorkoutType::Easy, None);
        done.status = WorkoutStatus::Completed;
        let views: Vec<WorkoutView> = [done, workout(1, WorkoutType::CrossTraining, None), workout(2, WorkoutType::Easy, None)]
            .iter()
            .map(|w| render_workout(w, durations(), &units, None))
            .collect();

        let weeks = summarize_weeks(&views);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].workouts, 2);
        assert_eq!(weeks[0].completed, 1);
        assert_eq!(weeks[0].total_distance_km, 14.0);
        assert_eq!(weeks[0].total_duration_minutes, 180.0);
        assert_eq!(weeks[1].week_number, 2);
    }
}
