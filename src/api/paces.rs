use axum::{extract::Query, response::Json};
use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, PlanResult};
use crate::models::DistanceUnit;
use crate::services::pace_model::{compute_paces, PaceDisplay, TrainingPaces};

#[derive(Debug, Deserialize)]
pub struct PaceQuery {
    pub fitness_score: f64,
    /// `km` (default) or `mi`
    pub unit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaceResponse {
    pub fitness_score: f64,
    /// Fractions of a day per kilometre
    pub paces: TrainingPaces,
    pub display: PaceDisplay,
}

/// Training paces for a fitness score
pub async fn get_paces(Query(query): Query<PaceQuery>) -> PlanResult<Json<PaceResponse>> {
    let unit = match query.unit.as_deref() {
        Some(raw) => raw.parse::<DistanceUnit>().map_err(PlanError::Validation)?,
        None => DistanceUnit::Km,
    };
    let paces = compute_paces(query.fitness_score).ok_or_else(|| {
        PlanError::validation(format!("no paces for fitness score {}", query.fitness_score))
    })?;

    Ok(Json(PaceResponse {
        fitness_score: query.fitness_score,
        display: paces.display(unit),
        paces,
    }))
}
