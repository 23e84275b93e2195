//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use seatline_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NotAvailable => StatusCode::FORBIDDEN,
        ErrorKind::SeatNotAvailable | ErrorKind::InvalidState | ErrorKind::Conflict => {
            StatusCode::CONFLICT
        }
        ErrorKind::NotBookable => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Database | ErrorKind::Cache | ErrorKind::ExternalService => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::Serialization | ErrorKind::Configuration | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Wrapper so the foreign `AppError` can implement `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind);
        if status.is_server_error() {
            tracing::error!(kind = %err.kind, error = %err, "Request failed");
        }

        let body = ApiErrorResponse {
            error: err.kind.as_code().to_string(),
            message: err.message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_kinds_map_to_client_errors() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::SeatNotAvailable), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::NotAvailable), StatusCode::FORBIDDEN);
        assert!(status_for(ErrorKind::Validation).is_client_error());
        assert!(status_for(ErrorKind::Database).is_server_error());
    }

    #[test]
    fn test_response_carries_code() {
        let response = ApiError(AppError::not_found("Trip missing")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
