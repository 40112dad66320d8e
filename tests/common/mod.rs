// Shared fixtures: a seeded in-memory store and a registered runner

#![allow(dead_code)]

use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use stride_planner::config::TemplateSeeder;
use stride_planner::models::{
    DistanceUnit, ExperienceLevel, PlanGenerationRequest, RaceDistance, RunnerProfile, UpsertRunnerProfile,
};
use stride_planner::repository::{InMemoryStore, PlanRepository};
use stride_planner::services::{GenerationPolicy, PlanGenerationService, PlanLifecycleService};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    TemplateSeeder::new(store.clone()).seed_all().await.unwrap();
    store
}

pub async fn register_runner(store: &InMemoryStore) -> RunnerProfile {
    let profile = UpsertRunnerProfile {
        display_name: Some("Test Runner".to_string()),
        experience_level: ExperienceLevel::Novice,
        race_goal: Some(RaceDistance::TenK),
        fitness_score: 50.0,
        training_days_per_week: 4,
        race_date: Some(date(2025, 12, 1)),
        training_start_date: Some(date(2025, 8, 1)),
        preferred_unit: DistanceUnit::Km,
    }
    .into_profile(Uuid::new_v4());
    store.upsert_runner(&profile).await.unwrap();
    profile
}

/// 10K, Novice, fitness 50, 4 days a week, 2025-08-01 to 2025-12-01
pub fn ten_k_request(runner_id: Uuid) -> PlanGenerationRequest {
    PlanGenerationRequest {
        runner_id,
        race_type: RaceDistance::TenK,
        experience_level: ExperienceLevel::Novice,
        fitness_score: 50.0,
        training_days: 4,
        race_date: date(2025, 12, 1),
        start_date: date(2025, 8, 1),
        plan_name: None,
        plan_description: None,
        plan_id: None,
    }
}

pub fn generator(store: &Arc<InMemoryStore>) -> PlanGenerationService {
    PlanGenerationService::new(store.clone(), store.clone(), GenerationPolicy::default())
}

pub fn lifecycle(store: &Arc<InMemoryStore>) -> PlanLifecycleService {
    PlanLifecycleService::new(store.clone())
}
