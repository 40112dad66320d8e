use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use super::routes::AppState;
use crate::errors::{PlanError, PlanResult};
use crate::models::{GenerationOutcome, GeneratePlanBody, RunnerProfile, TrainingPlan, UpsertRunnerProfile};

pub fn runner_routes() -> Router<AppState> {
    Router::new()
        .route("/:runner_id", get(get_runner).put(put_runner))
        .route("/:runner_id/plans", get(list_plans).post(generate_plan))
        .route("/:runner_id/plans/active", get(active_plan))
        .route("/:runner_id/plans/from-profile", post(generate_from_profile))
}

pub async fn get_runner(
    State(state): State<AppState>,
    Path(runner_id): Path<Uuid>,
) -> PlanResult<Json<RunnerProfile>> {
    Ok(Json(state.runners.get_profile(runner_id).await?))
}

/// Create or replace a runner profile
pub async fn put_runner(
    State(state): State<AppState>,
    Path(runner_id): Path<Uuid>,
    Json(body): Json<UpsertRunnerProfile>,
) -> PlanResult<Json<RunnerProfile>> {
    Ok(Json(state.runners.upsert_profile(runner_id, body).await?))
}

/// Plans of a runner, newest first
pub async fn list_plans(
    State(state): State<AppState>,
    Path(runner_id): Path<Uuid>,
) -> PlanResult<Json<Vec<TrainingPlan>>> {
    Ok(Json(state.lifecycle.list_plans(runner_id).await?))
}

pub async fn active_plan(
    State(state): State<AppState>,
    Path(runner_id): Path<Uuid>,
) -> PlanResult<Json<TrainingPlan>> {
    state
        .lifecycle
        .active_plan(runner_id)
        .await?
        .map(Json)
        .ok_or_else(|| PlanError::not_found(format!("active plan of runner {}", runner_id)))
}

/// Generate a new plan; it becomes the runner's active plan
pub async fn generate_plan(
    State(state): State<AppState>,
    Path(runner_id): Path<Uuid>,
    Json(body): Json<GeneratePlanBody>,
) -> PlanResult<(StatusCode, Json<GenerationOutcome>)> {
    let outcome = state.generator.generate(body.into_request(runner_id, None)).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Generate a new plan from the stored profile's race goal and dates
pub async fn generate_from_profile(
    State(state): State<AppState>,
    Path(runner_id): Path<Uuid>,
) -> PlanResult<(StatusCode, Json<GenerationOutcome>)> {
    let outcome = state.generator.generate_for_runner(runner_id).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
