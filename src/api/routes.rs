use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::health::health_check;
use super::paces::get_paces;
use super::plans::plan_routes;
use super::runners::runner_routes;
use super::workouts::workout_routes;
use crate::repository::{PlanRepository, TemplateRepository};
use crate::services::{
    GenerationPolicy, PlanGenerationService, PlanLifecycleService, RunnerProfileService, ScheduleService,
};

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub generator: PlanGenerationService,
    pub lifecycle: PlanLifecycleService,
    pub schedule: ScheduleService,
    pub runners: RunnerProfileService,
}

impl AppState {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        templates: Arc<dyn TemplateRepository>,
        policy: GenerationPolicy,
    ) -> Self {
        Self {
            generator: PlanGenerationService::new(plans.clone(), templates, policy),
            lifecycle: PlanLifecycleService::new(plans.clone()),
            schedule: ScheduleService::new(plans.clone()),
            runners: RunnerProfileService::new(plans),
        }
    }
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/paces", get(get_paces))
        .nest("/api/runners", runner_routes())
        .nest("/api/plans", plan_routes())
        .nest("/api/workouts", workout_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}
