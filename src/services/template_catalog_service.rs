use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{PlanError, PlanResult};
use crate::models::{
    ExperienceLevel, RaceDistance, StructureTemplate, TrainingPhase, WeeklySlot, WorkoutType,
};
use crate::repository::{PlanRepository, StoreError, TemplateRepository};

/// Pick the template that wins among several matching the same key:
/// latest `created_at`, then the highest id.
pub fn select_authoritative(candidates: Vec<StructureTemplate>) -> Option<StructureTemplate> {
    candidates
        .into_iter()
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
}

/// Read side of the curated template tables
#[derive(Clone)]
pub struct TemplateCatalogService {
    templates: Arc<dyn TemplateRepository>,
    plans: Arc<dyn PlanRepository>,
}

impl TemplateCatalogService {
    pub fn new(templates: Arc<dyn TemplateRepository>, plans: Arc<dyn PlanRepository>) -> Self {
        Self { templates, plans }
    }

    /// Exact match on every key given. A race is a hard filter: templates for
    /// other races, or with no race, never stand in.
    pub async fn lookup_structure(
        &self,
        workout_type: WorkoutType,
        level: ExperienceLevel,
        phase: TrainingPhase,
        race: Option<RaceDistance>,
    ) -> Result<Option<StructureTemplate>, StoreError> {
        let candidates = self
            .templates
            .structure_templates(workout_type, level, phase, race)
            .await?;
        Ok(select_authoritative(candidates))
    }

    /// Same lookup with the race taken from an existing plan.
    pub async fn lookup_structure_for_plan(
        &self,
        plan_id: Uuid,
        workout_type: WorkoutType,
        level: ExperienceLevel,
        phase: TrainingPhase,
    ) -> PlanResult<Option<StructureTemplate>> {
        let plan = self
            .plans
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| PlanError::not_found(format!("plan {}", plan_id)))?;

        Ok(self
            .lookup_structure(workout_type, level, phase, Some(plan.race_type))
            .await?)
    }

    /// Weekday slots for a weekly training-day count, by priority then weekday.
    pub async fn lookup_weekly_pattern(
        &self,
        training_days: i32,
        phase: TrainingPhase,
    ) -> Result<Vec<WeeklySlot>, StoreError> {
        let mut slots = self.templates.weekly_schedule(training_days, phase).await?;
        slots.sort_by_key(|slot| (slot.priority, slot.day_offset()));
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewStructureTemplate, PlanMetadata, PlanStatus, TrainingPlan, WorkoutStructure};
    use crate::repository::InMemoryStore;
    use chrono::{Duration, NaiveDate, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn template(id: i64, minutes_ago: i64) -> StructureTemplate {
        StructureTemplate {
            id,
            workout_type: WorkoutType::Tempo,
            experience_level: ExperienceLevel::Novice,
            phase: TrainingPhase::Build,
            race_distance: Some(RaceDistance::TenK),
            structure: WorkoutStructure::from_value(json!({"distance": 5.0, "pace": "threshold"})).unwrap(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn latest_created_wins() {
        let winner = select_authoritative(vec![template(1, 5), template(2, 30), template(3, 10)]).unwrap();
        assert_eq!(winner.id, 1);
    }

    #[test]
    fn equal_timestamps_fall_back_to_highest_id() {
        let older = template(7, 0);
        let mut newer = template(9, 0);
        newer.created_at = older.created_at;
        let winner = select_authoritative(vec![newer, older]).unwrap();
        assert_eq!(winner.id, 9);
        assert!(select_authoritative(Vec::new()).is_none());
    }

    fn new_template(race: Option<RaceDistance>, distance: f64) -> NewStructureTemplate {
        NewStructureTemplate {
            workout_type: WorkoutType::Tempo,
            experience_level: ExperienceLevel::Novice,
            phase: TrainingPhase::Build,
            race_distance: race,
            structure: WorkoutStructure::from_value(json!({"distance": distance, "pace": "threshold"})).unwrap(),
        }
    }

    #[tokio::test]
    async fn race_filter_is_exact() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_structure_template(&new_template(None, 4.0)).await.unwrap();
        store
            .insert_structure_template(&new_template(Some(RaceDistance::FiveK), 3.0))
            .await
            .unwrap();
        let catalog = TemplateCatalogService::new(store.clone(), store.clone());

        let ten_k = catalog
            .lookup_structure(WorkoutType::Tempo, ExperienceLevel::Novice, TrainingPhase::Build, Some(RaceDistance::TenK))
            .await
            .unwrap();
        assert!(ten_k.is_none());

        let five_k = catalog
            .lookup_structure(WorkoutType::Tempo, ExperienceLevel::Novice, TrainingPhase::Build, Some(RaceDistance::FiveK))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(five_k.race_distance, Some(RaceDistance::FiveK));
    }

    #[tokio::test]
    async fn newest_insert_is_authoritative() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_structure_template(&new_template(Some(RaceDistance::TenK), 4.0))
            .await
            .unwrap();
        let second = store
            .insert_structure_template(&new_template(Some(RaceDistance::TenK), 6.0))
            .await
            .unwrap();
        let catalog = TemplateCatalogService::new(store.clone(), store.clone());

        let found = catalog
            .lookup_structure(WorkoutType::Tempo, ExperienceLevel::Novice, TrainingPhase::Build, Some(RaceDistance::TenK))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, second.id);
    }

    fn stored_plan(race: RaceDistance) -> TrainingPlan {
        let now = Utc::now();
        TrainingPlan {
            id: Uuid::new_v4(),
            runner_id: Uuid::new_v4(),
            name: None,
            description: None,
            race_type: race,
            experience_level: ExperienceLevel::Novice,
            training_days: 4,
            start_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            race_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            status: PlanStatus::Active,
            plan_metadata: PlanMetadata { total_weeks: 15, base_weeks: 4, build_weeks: 6, peak_weeks: 4, taper_weeks: 1 },
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn plan_lookup_uses_the_plans_race() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_structure_template(&new_template(Some(RaceDistance::FiveK), 3.0))
            .await
            .unwrap();
        let ten_k_template = store
            .insert_structure_template(&new_template(Some(RaceDistance::TenK), 6.0))
            .await
            .unwrap();
        let ten_k_plan = stored_plan(RaceDistance::TenK);
        let marathon_plan = stored_plan(RaceDistance::Marathon);
        store.save_generated_plan(&ten_k_plan, &[]).await.unwrap();
        store.save_generated_plan(&marathon_plan, &[]).await.unwrap();
        let catalog = TemplateCatalogService::new(store.clone(), store.clone());

        let found = catalog
            .lookup_structure_for_plan(ten_k_plan.id, WorkoutType::Tempo, ExperienceLevel::Novice, TrainingPhase::Build)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, ten_k_template.id);
        assert_eq!(found.race_distance, Some(RaceDistance::TenK));

        let missing = catalog
            .lookup_structure_for_plan(marathon_plan.id, WorkoutType::Tempo, ExperienceLevel::Novice, TrainingPhase::Build)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn plan_lookup_requires_existing_plan() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = TemplateCatalogService::new(store.clone(), store.clone());
        let result = catalog
            .lookup_structure_for_plan(Uuid::new_v4(), WorkoutType::Tempo, ExperienceLevel::Novice, TrainingPhase::Build)
            .await;
        assert!(matches!(result, Err(PlanError::NotFound(_))));
    }
}
