use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use transita_core::CoreError;
use uuid::Uuid;

#[derive(Debug)]
pub enum AppError {
    Authentication(String),
    Validation(String),
    NotFound(String),
    SeatUnavailable(Vec<Uuid>),
    SeatConflict(Vec<Uuid>),
    InvalidState(String),
    Internal(anyhow::Error),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SeatUnavailable { seats } => AppError::SeatUnavailable(seats),
            CoreError::SeatConflict { seats } => AppError::SeatConflict(seats),
            CoreError::InvalidRequest(msg) => AppError::Validation(msg),
            CoreError::NotFound(msg) => AppError::NotFound(msg),
            CoreError::InvalidState(msg) => AppError::InvalidState(msg),
            CoreError::StorageFailure(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, seats) = match self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg, None),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::SeatUnavailable(seats) => (
                StatusCode::CONFLICT,
                "SEAT_UNAVAILABLE",
                "one or more seats are no longer available".to_string(),
                Some(seats),
            ),
            AppError::SeatConflict(seats) => (
                StatusCode::CONFLICT,
                "SEAT_CONFLICT",
                "one or more seats were taken before the booking committed".to_string(),
                Some(seats),
            ),
            AppError::InvalidState(msg) => (StatusCode::CONFLICT, "INVALID_STATE", msg, None),
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(seats) = seats {
            body["seats"] = json!(seats);
        }

        (status, Json(body)).into_response()
    }
}
