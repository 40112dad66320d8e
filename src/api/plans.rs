use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use super::routes::AppState;
use crate::errors::PlanResult;
use crate::models::{GeneratePlanBody, GenerationOutcome, PlanSchedule, TrainingPlan};

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/:plan_id", get(get_plan).delete(delete_plan))
        .route("/:plan_id/regenerate", post(regenerate_plan))
        .route("/:plan_id/activate", post(activate_plan))
        .route("/:plan_id/archive", post(archive_plan))
        .route("/:plan_id/complete", post(complete_plan))
        .route("/:plan_id/schedule", get(get_schedule))
}

pub async fn get_plan(State(state): State<AppState>, Path(plan_id): Path<Uuid>) -> PlanResult<Json<TrainingPlan>> {
    Ok(Json(state.lifecycle.get_plan(plan_id).await?))
}

pub async fn delete_plan(State(state): State<AppState>, Path(plan_id): Path<Uuid>) -> PlanResult<StatusCode> {
    state.lifecycle.delete(plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace every workout of the plan with a fresh generation
pub async fn regenerate_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<Uuid>,
    Json(body): Json<GeneratePlanBody>,
) -> PlanResult<Json<GenerationOutcome>> {
    let plan = state.lifecycle.get_plan(plan_id).await?;
    let outcome = state
        .generator
        .generate(body.into_request(plan.runner_id, Some(plan_id)))
        .await?;
    Ok(Json(outcome))
}

pub async fn activate_plan(State(state): State<AppState>, Path(plan_id): Path<Uuid>) -> PlanResult<Json<TrainingPlan>> {
    Ok(Json(state.lifecycle.activate(plan_id).await?))
}

pub async fn archive_plan(State(state): State<AppState>, Path(plan_id): Path<Uuid>) -> PlanResult<Json<TrainingPlan>> {
    Ok(Json(state.lifecycle.archive(plan_id).await?))
}

pub async fn complete_plan(State(state): State<AppState>, Path(plan_id): Path<Uuid>) -> PlanResult<Json<TrainingPlan>> {
    Ok(Json(state.lifecycle.complete(plan_id).await?))
}

/// Rendered workouts and weekly totals
pub async fn get_schedule(State(state): State<AppState>, Path(plan_id): Path<Uuid>) -> PlanResult<Json<PlanSchedule>> {
    Ok(Json(state.schedule.plan_schedule(plan_id).await?))
}
