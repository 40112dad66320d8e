use chrono::{Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{PlanError, PlanResult};
use crate::models::{
    DistanceUnit, ExperienceLevel, GenerationOutcome, PhaseDurations, PlanGenerationRequest,
    PlanStatus, RaceDistance, StructureTemplate, TemplateGap, TrainingPhase, TrainingPlan,
    WeeklySlot, Workout, WorkoutStatus, WorkoutType,
};
use crate::repository::{PlanRepository, StoreError, TemplateRepository};

use super::phase_duration_service::PhaseDurationService;
use super::template_catalog_service::TemplateCatalogService;
use super::workout_description_service::{describe, UnitConverter};

/// Behaviour switches of a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationPolicy {
    /// Workouts dated before "today" are created as completed.
    pub backfill_past_as_completed: bool,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            backfill_past_as_completed: true,
        }
    }
}

/// Starting distance in km of a workout type with no template.
pub fn base_distance_km(workout_type: WorkoutType) -> f64 {
    match workout_type {
        WorkoutType::Easy => 5.0,
        WorkoutType::Long => 10.0,
        WorkoutType::Tempo => 6.0,
        WorkoutType::Interval => 5.0,
        WorkoutType::Hill => 5.0,
        WorkoutType::Recovery => 3.0,
        WorkoutType::CrossTraining => 0.0,
    }
}

/// Starting duration in minutes of a workout type with no template.
pub fn base_duration_minutes(workout_type: WorkoutType) -> f64 {
    match workout_type {
        WorkoutType::Easy => 30.0,
        WorkoutType::Long => 60.0,
        WorkoutType::Tempo => 40.0,
        WorkoutType::Interval => 45.0,
        WorkoutType::Hill => 40.0,
        WorkoutType::Recovery => 25.0,
        WorkoutType::CrossTraining => 45.0,
    }
}

pub fn pace_label(workout_type: WorkoutType) -> Option<&'static str> {
    match workout_type {
        WorkoutType::Easy => Some("Easy pace"),
        WorkoutType::Long => Some("Easy to moderate"),
        WorkoutType::Tempo => Some("Threshold pace"),
        WorkoutType::Interval => Some("5K pace or faster"),
        WorkoutType::Hill => Some("Strong effort"),
        WorkoutType::Recovery => Some("Very easy"),
        WorkoutType::CrossTraining => None,
    }
}

/// Distance target when the structure gives none: base plus weekly progression.
pub fn progressive_distance_km(workout_type: WorkoutType, week: u32) -> f64 {
    match workout_type {
        WorkoutType::CrossTraining => 0.0,
        WorkoutType::Long => base_distance_km(workout_type) + 0.5 * week as f64,
        _ => base_distance_km(workout_type) + 0.2 * week as f64,
    }
}

/// Duration target when the structure gives none.
pub fn progressive_duration_minutes(workout_type: WorkoutType, week: u32) -> f64 {
    match workout_type {
        WorkoutType::Long => base_duration_minutes(workout_type) + 5.0 * week as f64,
        _ => base_duration_minutes(workout_type) + 2.0 * week as f64,
    }
}

// Caches for one generation run; level and race are fixed for the run.
#[derive(Default)]
struct RunLookups {
    patterns: HashMap<TrainingPhase, Vec<WeeklySlot>>,
    structures: HashMap<(WorkoutType, TrainingPhase), Option<StructureTemplate>>,
    gaps: Vec<TemplateGap>,
}

#[derive(Clone)]
pub struct PlanGenerationService {
    plans: Arc<dyn PlanRepository>,
    catalog: TemplateCatalogService,
    phase_durations: PhaseDurationService,
    policy: GenerationPolicy,
}

impl PlanGenerationService {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        templates: Arc<dyn TemplateRepository>,
        policy: GenerationPolicy,
    ) -> Self {
        Self {
            catalog: TemplateCatalogService::new(templates.clone(), plans.clone()),
            phase_durations: PhaseDurationService::new(templates),
            plans,
            policy,
        }
    }

    /// Generate, or regenerate when `request.plan_id` is set, a plan dated from today.
    pub async fn generate(&self, request: PlanGenerationRequest) -> PlanResult<GenerationOutcome> {
        self.generate_as_of(request, Utc::now().date_naive()).await
    }

    /// Generate a new plan from the runner's stored profile.
    pub async fn generate_for_runner(&self, runner_id: Uuid) -> PlanResult<GenerationOutcome> {
        let runner = self
            .plans
            .get_runner(runner_id)
            .await?
            .ok_or_else(|| PlanError::not_found(format!("runner {}", runner_id)))?;

        let race_type = runner
            .race_goal
            .ok_or_else(|| PlanError::validation("runner profile has no race goal"))?;
        let race_date = runner
            .race_date
            .ok_or_else(|| PlanError::validation("runner profile has no race date"))?;
        let start_date = runner
            .training_start_date
            .ok_or_else(|| PlanError::validation("runner profile has no training start date"))?;

        let request = PlanGenerationRequest {
            runner_id,
            race_type,
            experience_level: runner.experience_level,
            fitness_score: runner.fitness_score,
            training_days: runner.training_days_per_week,
            race_date,
            start_date,
            plan_name: None,
            plan_description: None,
            plan_id: None,
        };
        self.generate(request).await
    }

    /// Generation with an explicit "today", which decides which workouts are
    /// backfilled as completed.
    pub async fn generate_as_of(
        &self,
        request: PlanGenerationRequest,
        today: NaiveDate,
    ) -> PlanResult<GenerationOutcome> {
        validate_request(&request)?;

        if self.plans.get_runner(request.runner_id).await?.is_none() {
            return Err(PlanError::not_found(format!("runner {}", request.runner_id)));
        }

        let existing = match request.plan_id {
            Some(plan_id) => {
                let plan = self
                    .plans
                    .get_plan(plan_id)
                    .await?
                    .filter(|plan| plan.runner_id == request.runner_id)
                    .ok_or_else(|| {
                        PlanError::not_found(format!("plan {} of runner {}", plan_id, request.runner_id))
                    })?;
                Some(plan)
            }
            None => None,
        };

        let durations = self
            .phase_durations
            .resolve(request.race_type, request.experience_level)
            .await?;
        let total_weeks = durations.total_weeks();
        if total_weeks == 0 {
            return Err(PlanError::ConfigurationGap(format!(
                "phase durations for {} / {} add up to zero weeks",
                request.race_type, request.experience_level
            )));
        }

        let plan_id = existing.as_ref().map_or_else(Uuid::new_v4, |plan| plan.id);
        let mut lookups = RunLookups::default();
        let workouts = self
            .build_workouts(&request, plan_id, durations, today, &mut lookups)
            .await?;

        if lookups.patterns.values().all(Vec::is_empty) {
            return Err(PlanError::ConfigurationGap(format!(
                "no weekly pattern for {} training days in any phase",
                request.training_days
            )));
        }
        if workouts.is_empty() {
            return Err(PlanError::ConfigurationGap(format!(
                "no workout fits between {} and race day {}",
                request.start_date, request.race_date
            )));
        }

        let now = Utc::now();
        let regenerated = existing.is_some();
        let plan = TrainingPlan {
            id: plan_id,
            runner_id: request.runner_id,
            name: request
                .plan_name
                .clone()
                .or_else(|| existing.as_ref().and_then(|p| p.name.clone()))
                .or_else(|| Some(format!("{} training plan", request.race_type))),
            description: request
                .plan_description
                .clone()
                .or_else(|| existing.as_ref().and_then(|p| p.description.clone())),
            race_type: request.race_type,
            experience_level: request.experience_level,
            training_days: request.training_days,
            start_date: request.start_date,
            race_date: request.race_date,
            // Regeneration keeps whatever status the stored row has at write time.
            status: existing.as_ref().map_or(PlanStatus::Active, |p| p.status),
            plan_metadata: durations.into(),
            created_at: existing.as_ref().map_or(now, |p| p.created_at),
            updated_at: now,
        };

        if regenerated {
            // The plan may have been deleted since it was read.
            if !self.plans.replace_generated_plan(&plan, &workouts).await? {
                return Err(PlanError::not_found(format!("plan {}", plan.id)));
            }
        } else {
            self.plans.save_generated_plan(&plan, &workouts).await?;
        }

        info!(
            "{} plan {} for runner {}: {} weeks, {} workouts, {} template gaps",
            if regenerated { "Regenerated" } else { "Generated" },
            plan.id,
            plan.runner_id,
            total_weeks,
            workouts.len(),
            lookups.gaps.len()
        );

        Ok(GenerationOutcome {
            plan_id: plan.id,
            regenerated,
            total_weeks,
            workouts_created: workouts.len(),
            template_gaps: lookups.gaps,
        })
    }

    async fn build_workouts(
        &self,
        request: &PlanGenerationRequest,
        plan_id: Uuid,
        durations: PhaseDurations,
        today: NaiveDate,
        lookups: &mut RunLookups,
    ) -> PlanResult<Vec<Workout>> {
        let units = UnitConverter::new(DistanceUnit::Km);
        let created_at = Utc::now();
        let mut workouts = Vec::new();

        for week in 1..=durations.total_weeks() {
            let phase = durations.phase_for_week(week);
            let slots = self.weekly_pattern(request.training_days, phase, lookups).await?;

            for slot in slots {
                let offset = (week as i64 - 1) * 7 + slot.day_offset();
                let date = request.start_date + Duration::days(offset);
                if date >= request.race_date {
                    continue;
                }

                let template = self
                    .structure_for(slot.workout_type, request.experience_level, phase, request.race_type, lookups)
                    .await;
                let structure = template.as_ref().map(|t| &t.structure);

                let distance_km = match slot.workout_type {
                    WorkoutType::CrossTraining => 0.0,
                    workout_type => structure
                        .and_then(|s| s.min_distance)
                        .unwrap_or_else(|| progressive_distance_km(workout_type, week)),
                };
                let duration_minutes = structure
                    .and_then(|s| s.min_duration)
                    .unwrap_or_else(|| progressive_duration_minutes(slot.workout_type, week));

                let status = if self.policy.backfill_past_as_completed && date < today {
                    WorkoutStatus::Completed
                } else {
                    WorkoutStatus::Pending
                };

                workouts.push(Workout {
                    id: Uuid::new_v4(),
                    plan_id,
                    date,
                    week_number: week as i32,
                    phase,
                    workout_type: slot.workout_type,
                    intensity: slot.workout_type.intensity(),
                    distance_target_km: Some(distance_km),
                    duration_minutes: Some(duration_minutes.round() as i32),
                    pace_target: pace_label(slot.workout_type).map(str::to_string),
                    status,
                    structure_ref: template.as_ref().map(|t| t.id),
                    structure_json: structure.cloned(),
                    description: Some(describe(slot.workout_type, structure, &units, None)),
                    notes: None,
                    created_at,
                });
            }
        }

        Ok(workouts)
    }

    async fn weekly_pattern(
        &self,
        training_days: i32,
        phase: TrainingPhase,
        lookups: &mut RunLookups,
    ) -> Result<Vec<WeeklySlot>, StoreError> {
        if let Some(slots) = lookups.patterns.get(&phase) {
            return Ok(slots.clone());
        }
        let slots = self.catalog.lookup_weekly_pattern(training_days, phase).await?;
        if slots.is_empty() {
            warn!("No weekly pattern for {} training days in {} phase", training_days, phase);
        }
        lookups.patterns.insert(phase, slots.clone());
        Ok(slots)
    }

    /// Template for a slot, or `None` with a recorded gap. Never fails the run.
    async fn structure_for(
        &self,
        workout_type: WorkoutType,
        level: ExperienceLevel,
        phase: TrainingPhase,
        race: RaceDistance,
        lookups: &mut RunLookups,
    ) -> Option<StructureTemplate> {
        if let Some(cached) = lookups.structures.get(&(workout_type, phase)) {
            return cached.clone();
        }

        let reason = match self.catalog.lookup_structure(workout_type, level, phase, Some(race)).await {
            Ok(Some(template)) => {
                debug!("Using structure template {} for {} / {}", template.id, workout_type, phase);
                lookups.structures.insert((workout_type, phase), Some(template.clone()));
                return Some(template);
            }
            Ok(None) => "no matching template".to_string(),
            Err(StoreError::MalformedTemplate { key, reason }) => format!("malformed {}: {}", key, reason),
            Err(err) => format!("lookup failed: {}", err),
        };

        warn!(
            "Template gap for {} / {} / {} / {}: {}, using built-in defaults",
            workout_type, level, phase, race, reason
        );
        lookups.gaps.push(TemplateGap {
            workout_type,
            experience_level: level,
            phase,
            race_distance: race,
            reason,
        });
        lookups.structures.insert((workout_type, phase), None);
        None
    }
}

fn validate_request(request: &PlanGenerationRequest) -> PlanResult<()> {
    if !(1..=7).contains(&request.training_days) {
        return Err(PlanError::validation(format!(
            "training days must be between 1 and 7, got {}",
            request.training_days
        )));
    }
    if request.start_date >= request.race_date {
        return Err(PlanError::validation(format!(
            "start date {} must be before race date {}",
            request.start_date, request.race_date
        )));
    }
    if !request.fitness_score.is_finite() || request.fitness_score <= 0.0 {
        return Err(PlanError::validation(format!(
            "fitness score must be a positive number, got {}",
            request.fitness_score
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RunnerProfile, WorkoutStructure};
    use crate::repository::{InMemoryStore, MockTemplateRepository};
    use assert_matches::assert_matches;
    use chrono::Weekday;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn store_with_runner() -> (Arc<InMemoryStore>, Uuid) {
        let store = Arc::new(InMemoryStore::new());
        let runner_id = Uuid::new_v4();
        let now = Utc::now();
        store
            .upsert_runner(&RunnerProfile {
                id: runner_id,
                display_name: None,
                experience_level: ExperienceLevel::Novice,
                race_goal: Some(RaceDistance::TenK),
                fitness_score: 50.0,
                training_days_per_week: 2,
                race_date: None,
                training_start_date: None,
                preferred_unit: DistanceUnit::Km,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        (store, runner_id)
    }

    fn request(runner_id: Uuid) -> PlanGenerationRequest {
        PlanGenerationRequest {
            runner_id,
            race_type: RaceDistance::TenK,
            experience_level: ExperienceLevel::Novice,
            fitness_score: 50.0,
            training_days: 2,
            race_date: date(2025, 12, 1),
            start_date: date(2025, 8, 1),
            plan_name: None,
            plan_description: None,
            plan_id: None,
        }
    }

    fn two_day_templates() -> MockTemplateRepository {
        let mut repo = MockTemplateRepository::new();
        repo.expect_phase_durations()
            .returning(|_, _| Ok(Some(PhaseDurations { base_weeks: 2, build_weeks: 1, peak_weeks: 1, taper_weeks: 1 })));
        repo.expect_weekly_schedule().returning(|_, _| {
            Ok(vec![
                WeeklySlot { day_of_week: Weekday::Sun, workout_type: WorkoutType::Long, priority: 1 },
                WeeklySlot { day_of_week: Weekday::Wed, workout_type: WorkoutType::Interval, priority: 2 },
            ])
        });
        repo
    }

    #[test]
    fn fallback_tables_progress_by_week() {
        assert_eq!(progressive_distance_km(WorkoutType::Long, 4), 12.0);
        assert!((progressive_distance_km(WorkoutType::Easy, 3) - 5.6).abs() < 1e-9);
        assert_eq!(progressive_distance_km(WorkoutType::CrossTraining, 9), 0.0);
        assert_eq!(progressive_duration_minutes(WorkoutType::Long, 4), 80.0);
        assert_eq!(progressive_duration_minutes(WorkoutType::Tempo, 3), 46.0);
        assert_eq!(pace_label(WorkoutType::Interval), Some("5K pace or faster"));
        assert_eq!(pace_label(WorkoutType::CrossTraining), None);
    }

    #[tokio::test]
    async fn failing_template_lookups_degrade_to_defaults() {
        let (store, runner_id) = store_with_runner().await;
        let mut templates = two_day_templates();
        templates
            .expect_structure_templates()
            .returning(|_, _, _, _| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));

        let service = PlanGenerationService::new(store.clone(), Arc::new(templates), GenerationPolicy::default());
        let outcome = service.generate_as_of(request(runner_id), date(2025, 7, 1)).await.unwrap();

        assert_eq!(outcome.total_weeks, 5);
        assert_eq!(outcome.workouts_created, 10);
        // One gap per (type, phase) pair: 2 types × 4 phases.
        assert_eq!(outcome.template_gaps.len(), 8);
        assert!(outcome.template_gaps.iter().all(|gap| gap.reason.starts_with("lookup failed")));

        let workouts = store.list_workouts(outcome.plan_id).await.unwrap();
        let first_long = workouts.iter().find(|w| w.workout_type == WorkoutType::Long).unwrap();
        assert_eq!(first_long.distance_target_km, Some(10.5));
        assert_eq!(first_long.duration_minutes, Some(65));
        assert_eq!(first_long.structure_ref, None);
        assert_eq!(first_long.pace_target.as_deref(), Some("Easy to moderate"));
    }

    #[tokio::test]
    async fn template_values_and_snapshot_are_used() {
        let (store, runner_id) = store_with_runner().await;
        let mut templates = two_day_templates();
        templates.expect_structure_templates().returning(|workout_type, level, phase, race| {
            if workout_type != WorkoutType::Interval {
                return Ok(Vec::new());
            }
            Ok(vec![StructureTemplate {
                id: 42,
                workout_type,
                experience_level: level,
                phase,
                race_distance: race,
                structure: WorkoutStructure::from_value(json!({"reps": 6, "distance": 0.4, "rest": 90, "minDuration": 35}))
                    .unwrap(),
                created_at: Utc::now(),
            }])
        });

        let service = PlanGenerationService::new(store.clone(), Arc::new(templates), GenerationPolicy::default());
        let outcome = service.generate_as_of(request(runner_id), date(2025, 7, 1)).await.unwrap();
        assert_eq!(outcome.template_gaps.len(), 4);

        let workouts = store.list_workouts(outcome.plan_id).await.unwrap();
        let interval = workouts.iter().find(|w| w.workout_type == WorkoutType::Interval).unwrap();
        assert_eq!(interval.structure_ref, Some(42));
        assert_eq!(interval.duration_minutes, Some(35));
        assert_eq!(interval.description.as_deref(), Some("6x400m @ 5K pace with 90s rest"));
        assert!(interval.structure_json.is_some());
    }

    #[tokio::test]
    async fn missing_weekly_pattern_is_a_configuration_gap() {
        let (store, runner_id) = store_with_runner().await;
        let mut templates = MockTemplateRepository::new();
        templates.expect_phase_durations().returning(|_, _| Ok(None));
        templates.expect_weekly_schedule().returning(|_, _| Ok(Vec::new()));

        let service = PlanGenerationService::new(store.clone(), Arc::new(templates), GenerationPolicy::default());
        let result = service.generate_as_of(request(runner_id), date(2025, 7, 1)).await;
        assert_matches!(result, Err(PlanError::ConfigurationGap(_)));
        assert!(store.list_plans(runner_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_week_durations_are_a_configuration_gap() {
        let (store, runner_id) = store_with_runner().await;
        let mut templates = MockTemplateRepository::new();
        templates
            .expect_phase_durations()
            .returning(|_, _| Ok(Some(PhaseDurations { base_weeks: 0, build_weeks: 0, peak_weeks: 0, taper_weeks: 0 })));

        let service = PlanGenerationService::new(store, Arc::new(templates), GenerationPolicy::default());
        assert_matches!(
            service.generate_as_of(request(runner_id), date(2025, 7, 1)).await,
            Err(PlanError::ConfigurationGap(_))
        );
    }

    #[tokio::test]
    async fn invalid_requests_fail_before_any_lookup() {
        let (store, runner_id) = store_with_runner().await;
        // No expectations: any template call would panic.
        let service = PlanGenerationService::new(store, Arc::new(MockTemplateRepository::new()), GenerationPolicy::default());

        let mut bad_days = request(runner_id);
        bad_days.training_days = 8;
        assert_matches!(service.generate(bad_days).await, Err(PlanError::Validation(_)));

        let mut reversed = request(runner_id);
        reversed.start_date = reversed.race_date;
        assert_matches!(service.generate(reversed).await, Err(PlanError::Validation(_)));

        let mut unfit = request(runner_id);
        unfit.fitness_score = 0.0;
        assert_matches!(service.generate(unfit).await, Err(PlanError::Validation(_)));

        assert_matches!(service.generate(request(Uuid::new_v4())).await, Err(PlanError::NotFound(_)));

        let mut unknown_plan = request(runner_id);
        unknown_plan.plan_id = Some(Uuid::new_v4());
        assert_matches!(service.generate(unknown_plan).await, Err(PlanError::NotFound(_)));
    }

    #[tokio::test]
    async fn backfill_policy_controls_past_workouts() {
        let (store, runner_id) = store_with_runner().await;
        let mut templates = two_day_templates();
        templates.expect_structure_templates().returning(|_, _, _, _| Ok(Vec::new()));
        let templates: Arc<dyn TemplateRepository> = Arc::new(templates);

        // Two weeks into the plan.
        let today = date(2025, 8, 15);

        let backfilling = PlanGenerationService::new(store.clone(), templates.clone(), GenerationPolicy::default());
        let outcome = backfilling.generate_as_of(request(runner_id), today).await.unwrap();
        let workouts = store.list_workouts(outcome.plan_id).await.unwrap();
        for workout in &workouts {
            let expected = if workout.date < today { WorkoutStatus::Completed } else { WorkoutStatus::Pending };
            assert_eq!(workout.status, expected);
        }
        assert!(workouts.iter().any(|w| w.status == WorkoutStatus::Completed));

        let pending_only = PlanGenerationService::new(
            store.clone(),
            templates,
            GenerationPolicy { backfill_past_as_completed: false },
        );
        let outcome = pending_only.generate_as_of(request(runner_id), today).await.unwrap();
        let workouts = store.list_workouts(outcome.plan_id).await.unwrap();
        assert!(workouts.iter().all(|w| w.status == WorkoutStatus::Pending));
    }
}
