use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reservation::ServiceError;
use serde_json::json;
use thiserror::Error;
use types::errors::ReservationError;

/// Central error type for the Gateway application
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        AppError::Service(err.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::Service(err) => {
                let status = match err {
                    ServiceError::Reservation(ReservationError::Validation(_)) => {
                        StatusCode::BAD_REQUEST
                    }
                    ServiceError::Reservation(ReservationError::NotFound { .. }) => {
                        StatusCode::NOT_FOUND
                    }
                    ServiceError::Reservation(
                        ReservationError::MatchFull { .. }
                        | ReservationError::AlreadyJoined { .. }
                        | ReservationError::IdentityConflict { .. },
                    ) => StatusCode::CONFLICT,
                    ServiceError::Reservation(ReservationError::StorageUnavailable { .. }) => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    ServiceError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
                    ServiceError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::InternalError(e) => {
                tracing::error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            AppError::Service(e @ ServiceError::Worker(_)) => {
                tracing::error!(error = %e, "store worker failed");
                "Internal server error".to_string()
            }
            AppError::Service(e) if status == StatusCode::SERVICE_UNAVAILABLE => {
                tracing::warn!(error = %e, "storage unavailable");
                e.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": code,
            "message": message
        }));

        (status, body).into_response()
    }
}
