use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::affinity::ScoringError;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Scoring(ScoringError::InvalidInput { .. })
            | AppError::Scoring(ScoringError::DuplicateCandidate(_)) => StatusCode::BAD_REQUEST,
            AppError::Scoring(ScoringError::DegenerateVector { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Scoring(ScoringError::InvalidConfig(_))
            | AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalApi(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemId, UserId};

    #[test]
    fn test_not_found_status() {
        let response = AppError::NotFound("user 7".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_scoring_invalid_input_is_bad_request() {
        let err = AppError::from(ScoringError::InvalidInput {
            user_id: UserId(3),
            item_id: ItemId::new("B1"),
            reason: "rating 9 outside 1..=5".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_duplicate_candidate_is_bad_request() {
        let err = AppError::from(ScoringError::DuplicateCandidate(UserId(2)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_degenerate_vector_is_unprocessable() {
        let err = AppError::from(ScoringError::DegenerateVector {
            user_id: UserId(3),
            item_id: ItemId::new("B1"),
        });
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_external_api_is_bad_gateway() {
        let response = AppError::ExternalApi("timeout".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
