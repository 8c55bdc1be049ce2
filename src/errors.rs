use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Fixed 401 body for every protected endpoint.
pub const UNAUTHORIZED_MESSAGE: &str =
    "Unauthorized. Please provide valid authentication via session cookie or X-API-Token header.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthenticated,

    #[error("token name too short")]
    InvalidName,

    #[error("token not found")]
    TokenNotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            AppError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.to_string())
            }
            AppError::InvalidName => (
                StatusCode::BAD_REQUEST,
                "Token name must be at least 3 characters".to_string(),
            ),
            AppError::TokenNotFound => (StatusCode::NOT_FOUND, "Token not found".to_string()),
            AppError::Database(e) => {
                // Internal detail stays in the logs, never in the body.
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "message": msg,
        }));

        (status, body).into_response()
    }
}
