use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PlanRepository, StoreError, TemplateRepository};
use crate::models::{
    ExperienceLevel, NewStructureTemplate, PhaseDurationRecord, PhaseDurations, PlanStatus,
    RaceDistance, RunnerProfile, StructureTemplate, TemplateCounts, TrainingPhase, TrainingPlan,
    WeeklyScheduleRow, WeeklySlot, Workout, WorkoutStatus, WorkoutType,
};

#[derive(Default)]
struct State {
    runners: HashMap<Uuid, RunnerProfile>,
    plans: HashMap<Uuid, TrainingPlan>,
    workouts: HashMap<Uuid, Vec<Workout>>, // by plan id
    phase_durations: HashMap<(RaceDistance, ExperienceLevel), PhaseDurations>,
    structure_templates: Vec<StructureTemplate>,
    weekly_rows: Vec<WeeklyScheduleRow>,
    next_template_id: i64,
}

/// Store kept in process memory.
///
/// Every operation takes the single state lock for its whole duration, so
/// compound writes are observed all-or-nothing.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryStore {
    async fn phase_durations(
        &self,
        race: RaceDistance,
        level: ExperienceLevel,
    ) -> Result<Option<PhaseDurations>, StoreError> {
        let state = self.state.read().await;
        Ok(state.phase_durations.get(&(race, level)).copied())
    }

    async fn structure_templates(
        &self,
        workout_type: WorkoutType,
        level: ExperienceLevel,
        phase: TrainingPhase,
        race: Option<RaceDistance>,
    ) -> Result<Vec<StructureTemplate>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .structure_templates
            .iter()
            .filter(|t| t.workout_type == workout_type && t.experience_level == level && t.phase == phase)
            .filter(|t| race.map_or(true, |r| t.race_distance == Some(r)))
            .cloned()
            .collect())
    }

    async fn weekly_schedule(
        &self,
        training_days: i32,
        phase: TrainingPhase,
    ) -> Result<Vec<WeeklySlot>, StoreError> {
        let state = self.state.read().await;
        let mut slots: Vec<WeeklySlot> = state
            .weekly_rows
            .iter()
            .filter(|row| row.training_days == training_days && row.phase == phase)
            .map(|row| row.slot)
            .collect();
        slots.sort_by_key(|slot| (slot.priority, slot.day_offset()));
        Ok(slots)
    }

    async fn upsert_phase_durations(&self, record: &PhaseDurationRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state
            .phase_durations
            .insert((record.race_distance, record.experience_level), record.durations);
        Ok(())
    }

    async fn insert_structure_template(
        &self,
        template: &NewStructureTemplate,
    ) -> Result<StructureTemplate, StoreError> {
        let mut state = self.state.write().await;
        state.next_template_id += 1;
        let stored = StructureTemplate {
            id: state.next_template_id,
            workout_type: template.workout_type,
            experience_level: template.experience_level,
            phase: template.phase,
            race_distance: template.race_distance,
            structure: template.structure.clone(),
            created_at: Utc::now(),
        };
        state.structure_templates.push(stored.clone());
        Ok(stored)
    }

    async fn insert_weekly_slot(&self, row: &WeeklyScheduleRow) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.weekly_rows.push(row.clone());
        Ok(())
    }

    async fn template_counts(&self) -> Result<TemplateCounts, StoreError> {
        let state = self.state.read().await;
        Ok(TemplateCounts {
            phase_durations: state.phase_durations.len() as i64,
            structure_templates: state.structure_templates.len() as i64,
            weekly_slots: state.weekly_rows.len() as i64,
        })
    }
}

#[async_trait]
impl PlanRepository for InMemoryStore {
    async fn get_runner(&self, runner_id: Uuid) -> Result<Option<RunnerProfile>, StoreError> {
        let state = self.state.read().await;
        Ok(state.runners.get(&runner_id).cloned())
    }

    async fn upsert_runner(&self, runner: &RunnerProfile) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.runners.insert(runner.id, runner.clone());
        Ok(())
    }

    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<TrainingPlan>, StoreError> {
        let state = self.state.read().await;
        Ok(state.plans.get(&plan_id).cloned())
    }

    async fn list_plans(&self, runner_id: Uuid) -> Result<Vec<TrainingPlan>, StoreError> {
        let state = self.state.read().await;
        let mut plans: Vec<TrainingPlan> = state
            .plans
            .values()
            .filter(|p| p.runner_id == runner_id)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    async fn active_plan(&self, runner_id: Uuid) -> Result<Option<TrainingPlan>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .plans
            .values()
            .find(|p| p.runner_id == runner_id && p.status == PlanStatus::Active)
            .cloned())
    }

    async fn save_generated_plan(
        &self,
        plan: &TrainingPlan,
        workouts: &[Workout],
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if plan.status == PlanStatus::Active {
            for other in state.plans.values_mut() {
                if other.runner_id == plan.runner_id && other.id != plan.id && other.status == PlanStatus::Active {
                    other.status = PlanStatus::Archived;
                    other.updated_at = Utc::now();
                }
            }
        }
        state.plans.insert(plan.id, plan.clone());
        state.workouts.insert(plan.id, sorted_by_date(workouts));
        Ok(())
    }

    async fn replace_generated_plan(
        &self,
        plan: &TrainingPlan,
        workouts: &[Workout],
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let Some(existing) = state
            .plans
            .get_mut(&plan.id)
            .filter(|existing| existing.runner_id == plan.runner_id)
        else {
            return Ok(false);
        };
        *existing = TrainingPlan {
            status: existing.status,
            created_at: existing.created_at,
            ..plan.clone()
        };
        state.workouts.insert(plan.id, sorted_by_date(workouts));
        Ok(true)
    }

    async fn list_workouts(&self, plan_id: Uuid) -> Result<Vec<Workout>, StoreError> {
        let state = self.state.read().await;
        Ok(state.workouts.get(&plan_id).cloned().unwrap_or_default())
    }

    async fn update_workout_status(
        &self,
        workout_id: Uuid,
        status: WorkoutStatus,
    ) -> Result<Option<Workout>, StoreError> {
        let mut state = self.state.write().await;
        let workout = state
            .workouts
            .values_mut()
            .flat_map(|ws| ws.iter_mut())
            .find(|w| w.id == workout_id);
        Ok(workout.map(|w| {
            w.status = status;
            w.clone()
        }))
    }

    async fn activate_plan(&self, runner_id: Uuid, plan_id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let owned = state
            .plans
            .get(&plan_id)
            .map_or(false, |p| p.runner_id == runner_id);
        if !owned {
            return Ok(false);
        }
        let now = Utc::now();
        for plan in state.plans.values_mut().filter(|p| p.runner_id == runner_id) {
            if plan.id == plan_id {
                plan.status = PlanStatus::Active;
                plan.updated_at = now;
            } else if plan.status == PlanStatus::Active {
                plan.status = PlanStatus::Archived;
                plan.updated_at = now;
            }
        }
        Ok(true)
    }

    async fn set_plan_status(&self, plan_id: Uuid, status: PlanStatus) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state
            .plans
            .get_mut(&plan_id)
            .map(|plan| {
                plan.status = status;
                plan.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn delete_plan(&self, plan_id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        state.workouts.remove(&plan_id);
        Ok(state.plans.remove(&plan_id).is_some())
    }
}

fn sorted_by_date(workouts: &[Workout]) -> Vec<Workout> {
    let mut sorted = workouts.to_vec();
    sorted.sort_by_key(|w| w.date);
    sorted
}
