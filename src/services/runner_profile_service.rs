use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::errors::{PlanError, PlanResult};
use crate::models::{RunnerProfile, UpsertRunnerProfile};
use crate::repository::PlanRepository;

/// Runner profiles as supplied by the upstream profile forms
#[derive(Clone)]
pub struct RunnerProfileService {
    plans: Arc<dyn PlanRepository>,
}

impl RunnerProfileService {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    pub async fn get_profile(&self, runner_id: Uuid) -> PlanResult<RunnerProfile> {
        self.plans
            .get_runner(runner_id)
            .await?
            .ok_or_else(|| PlanError::not_found(format!("runner {}", runner_id)))
    }

    /// Create the profile, or replace it keeping its creation time.
    pub async fn upsert_profile(&self, runner_id: Uuid, data: UpsertRunnerProfile) -> PlanResult<RunnerProfile> {
        if !(1..=7).contains(&data.training_days_per_week) {
            return Err(PlanError::validation("training days per week must be between 1 and 7"));
        }
        if !data.fitness_score.is_finite() || data.fitness_score <= 0.0 {
            return Err(PlanError::validation("fitness score must be a positive number"));
        }
        if let (Some(start), Some(race)) = (data.training_start_date, data.race_date) {
            if start >= race {
                return Err(PlanError::validation("training start date must be before the race date"));
            }
        }

        let mut profile = data.into_profile(runner_id);
        if let Some(existing) = self.plans.get_runner(runner_id).await? {
            profile.created_at = existing.created_at;
            profile.updated_at = Utc::now();
        }

        self.plans.upsert_runner(&profile).await?;
        info!("Saved profile for runner {}", runner_id);
        Ok(profile)
    }
}
