//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use lumen_domain::error::LumenError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`LumenError`] (or a malformed request) to an HTTP response with the
/// appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Domain(LumenError),
    /// The request body could not be decoded.
    BadRequest(String),
}

impl From<LumenError> for ApiError {
    fn from(err: LumenError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Domain(LumenError::Validation(err)) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Domain(LumenError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Domain(LumenError::Conflict(err)) => (StatusCode::CONFLICT, err.to_string()),
            Self::Domain(LumenError::Device(err)) => {
                tracing::warn!(error = %err, "device error");
                (StatusCode::BAD_GATEWAY, "device error".to_string())
            }
            Self::Domain(LumenError::Storage(err)) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_domain::error::{ConflictError, NotFoundError, ValidationError};

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn should_map_domain_errors_to_status_codes() {
        assert_eq!(
            status_of(LumenError::from(ValidationError::EmptyName)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(LumenError::from(NotFoundError {
                entity: "Routine",
                id: "x".to_string()
            })),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(LumenError::from(ConflictError {
                entity: "Routine",
                id: "x".to_string()
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(LumenError::Device("bridge offline".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(LumenError::Storage("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn should_map_bad_request_body_to_400() {
        assert_eq!(
            status_of(ApiError::BadRequest("expected value".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
