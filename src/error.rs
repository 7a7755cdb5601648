use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Message returned when a recommendation name is already taken
pub const DUPLICATE_NAME_MESSAGE: &str = "Recommendations names must be unique";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Raised by storage when a unique constraint rejects a write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// `not_found` with the conventional empty message
    pub fn not_found() -> Self {
        AppError::NotFound(String::new())
    }

    /// `conflict` raised for duplicate recommendation names
    pub fn duplicate_name() -> Self {
        AppError::Conflict(DUPLICATE_NAME_MESSAGE.to_string())
    }

    /// Stable label for structured logging
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::ConstraintViolation(_) => "constraint_violation",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Validation(_) => "validation",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) | AppError::ConstraintViolation(msg) => {
                (StatusCode::CONFLICT, msg)
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, error.kind = self.kind(), "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::not_found(), StatusCode::NOT_FOUND),
            (AppError::duplicate_name(), StatusCode::CONFLICT),
            (
                AppError::ConstraintViolation("recommendations_name_key".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                AppError::InvalidInput("Cannot parse \"abc\" to a i32".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Internal("score out of range".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Validation("bad link".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_duplicate_name_message() {
        match AppError::duplicate_name() {
            AppError::Conflict(msg) => assert_eq!(msg, "Recommendations names must be unique"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(AppError::duplicate_name().kind(), "conflict");
        assert_eq!(AppError::not_found().kind(), "not_found");
    }
}
