use crate::utils::error::CarmsError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Handler failures, rendered as `{"detail": ...}` bodies.
#[derive(Debug)]
pub enum ApiError {
    NotFound(&'static str),
    Unprocessable(String),
    Internal(CarmsError),
}

impl From<CarmsError> for ApiError {
    fn from(err: CarmsError) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, what.to_string()),
            ApiError::Unprocessable(reason) => (StatusCode::UNPROCESSABLE_ENTITY, reason),
            ApiError::Internal(err) => {
                tracing::error!(
                    "Request failed: {} (Category: {:?}, Severity: {:?})",
                    err,
                    err.category(),
                    err.severity()
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
