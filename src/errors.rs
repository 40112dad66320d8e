use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::repository::StoreError;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Configuration gap: {0}")]
    ConfigurationGap(String),
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl PlanError {
    pub fn validation(message: impl Into<String>) -> Self {
        PlanError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        PlanError::NotFound(message.into())
    }
}

pub type PlanResult<T> = Result<T, PlanError>;

impl IntoResponse for PlanError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            PlanError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            PlanError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            PlanError::ConfigurationGap(_) => (StatusCode::UNPROCESSABLE_ENTITY, "configuration_gap"),
            PlanError::Persistence(err) => {
                tracing::error!(error = %err, "Persistence failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error")
            }
        };

        // Store internals stay in the logs.
        let message = match &self {
            PlanError::Persistence(_) => "The plan store could not complete the request".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(PlanError::validation("x").into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(PlanError::not_found("x").into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            PlanError::ConfigurationGap("x".into()).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            PlanError::from(StoreError::Database(sqlx::Error::PoolClosed)).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
