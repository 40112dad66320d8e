use axum::{
    extract::{Path, State},
    response::Json,
    routing::patch,
    Router,
};
use uuid::Uuid;

use super::routes::AppState;
use crate::errors::PlanResult;
use crate::models::{UpdateWorkoutStatus, Workout};

pub fn workout_routes() -> Router<AppState> {
    Router::new().route("/:workout_id/status", patch(update_status))
}

/// Runner marks a workout completed, skipped or pending again
pub async fn update_status(
    State(state): State<AppState>,
    Path(workout_id): Path<Uuid>,
    Json(body): Json<UpdateWorkoutStatus>,
) -> PlanResult<Json<Workout>> {
    Ok(Json(state.lifecycle.update_workout_status(workout_id, body.status).await?))
}
