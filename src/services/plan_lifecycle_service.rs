use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::errors::{PlanError, PlanResult};
use crate::models::{PlanStatus, TrainingPlan, Workout, WorkoutStatus};
use crate::repository::PlanRepository;

/// Status transitions of a runner's plans
#[derive(Clone)]
pub struct PlanLifecycleService {
    plans: Arc<dyn PlanRepository>,
}

impl PlanLifecycleService {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    pub async fn get_plan(&self, plan_id: Uuid) -> PlanResult<TrainingPlan> {
        self.plans
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| PlanError::not_found(format!("plan {}", plan_id)))
    }

    /// Plans of a runner, newest first.
    pub async fn list_plans(&self, runner_id: Uuid) -> PlanResult<Vec<TrainingPlan>> {
        self.ensure_runner(runner_id).await?;
        Ok(self.plans.list_plans(runner_id).await?)
    }

    pub async fn active_plan(&self, runner_id: Uuid) -> PlanResult<Option<TrainingPlan>> {
        self.ensure_runner(runner_id).await?;
        Ok(self.plans.active_plan(runner_id).await?)
    }

    /// Make this the runner's only active plan.
    pub async fn activate(&self, plan_id: Uuid) -> PlanResult<TrainingPlan> {
        let plan = self.get_plan(plan_id).await?;
        if !self.plans.activate_plan(plan.runner_id, plan_id).await? {
            return Err(PlanError::not_found(format!("plan {}", plan_id)));
        }
        info!("Activated plan {} for runner {}", plan_id, plan.runner_id);
        self.get_plan(plan_id).await
    }

    /// Archive one plan; sibling plans are left alone.
    pub async fn archive(&self, plan_id: Uuid) -> PlanResult<TrainingPlan> {
        self.set_status(plan_id, PlanStatus::Archived).await
    }

    pub async fn complete(&self, plan_id: Uuid) -> PlanResult<TrainingPlan> {
        self.set_status(plan_id, PlanStatus::Completed).await
    }

    /// Delete the plan and all of its workouts.
    pub async fn delete(&self, plan_id: Uuid) -> PlanResult<()> {
        if !self.plans.delete_plan(plan_id).await? {
            return Err(PlanError::not_found(format!("plan {}", plan_id)));
        }
        info!("Deleted plan {}", plan_id);
        Ok(())
    }

    pub async fn update_workout_status(&self, workout_id: Uuid, status: WorkoutStatus) -> PlanResult<Workout> {
        self.plans
            .update_workout_status(workout_id, status)
            .await?
            .ok_or_else(|| PlanError::not_found(format!("workout {}", workout_id)))
    }

    async fn set_status(&self, plan_id: Uuid, status: PlanStatus) -> PlanResult<TrainingPlan> {
        if !self.plans.set_plan_status(plan_id, status).await? {
            return Err(PlanError::not_found(format!("plan {}", plan_id)));
        }
        info!("Plan {} is now {:?}", plan_id, status);
        self.get_plan(plan_id).await
    }

    async fn ensure_runner(&self, runner_id: Uuid) -> PlanResult<()> {
        match self.plans.get_runner(runner_id).await? {
            Some(_) => Ok(()),
            None => Err(PlanError::not_found(format!("runner {}", runner_id))),
        }
    }
}
