use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::dao::{models::MalformedId, storage::StorageError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Identifier is not in the expected format.
    #[error("{0}")]
    MalformedId(#[from] MalformedId),
    /// Requested record was not found.
    #[error("{0}")]
    NotFound(String),
    /// Payload is well-formed but names records that do not exist.
    #[error("{0}")]
    Validation(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Payload rejected by validation.
    #[error("{0}")]
    UnprocessableEntity(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            // No record can live behind a malformed id, so the resource is simply absent.
            ServiceError::MalformedId(err) => AppError::NotFound(format!("not found: {err}")),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Validation(message) => AppError::UnprocessableEntity(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human readable description of the failure.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_surface_as_not_found() {
        let err: AppError = ServiceError::from(MalformedId("doesnotexist".into())).into();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn missing_records_keep_their_message() {
        let err: AppError = ServiceError::NotFound("track not found".into()).into();
        assert_eq!(err.to_string(), "track not found");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_failures_are_unprocessable() {
        let err: AppError = ServiceError::Validation("unknown track".into()).into();
        assert_eq!(err.to_string(), "unknown track");
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn degraded_mode_is_service_unavailable() {
        let err: AppError = ServiceError::Degraded.into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
