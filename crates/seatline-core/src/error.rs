//! Unified application error types for Seatline.
//!
//! Every crate maps its internal failures into [`AppError`] so reservation,
//! tracking, and broadcast code can propagate with `?` and callers can branch
//! on [`ErrorKind`] alone.

use std::fmt;
use thiserror::Error;

/// Error categories shared by the whole workspace.
///
/// The first six kinds are the domain outcomes callers are expected to
/// handle. The remaining kinds describe infrastructure failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The trip, booking, or hold does not exist (or is not visible to the caller).
    NotFound,
    /// The trip exists but no longer accepts bookings or holds.
    NotBookable,
    /// At least one requested seat is occupied or held.
    SeatNotAvailable,
    /// A policy blocks the operation (for example, the cancellation window has closed).
    NotAvailable,
    /// The entity is in a state that does not allow the operation.
    InvalidState,
    /// Input validation failed.
    Validation,
    /// A uniqueness collision that the caller may retry.
    Conflict,
    /// A database error occurred.
    Database,
    /// A cache error occurred.
    Cache,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// An external collaborator failed.
    ExternalService,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code for wire payloads.
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::NotBookable => "NOT_BOOKABLE",
            Self::SeatNotAvailable => "SEAT_NOT_AVAILABLE",
            Self::NotAvailable => "NOT_AVAILABLE",
            Self::InvalidState => "INVALID_STATE",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::Database => "DATABASE",
            Self::Cache => "CACHE",
            Self::Serialization => "SERIALIZATION",
            Self::Configuration => "CONFIGURATION",
            Self::ExternalService => "EXTERNAL_SERVICE",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether this kind is an expected business outcome rather than a fault.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::NotBookable
                | Self::SeatNotAvailable
                | Self::NotAvailable
                | Self::InvalidState
                | Self::Validation
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// The unified application error used throughout Seatline.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a not-bookable error.
    pub fn not_bookable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotBookable, message)
    }

    /// Create a seat-not-available error.
    pub fn seat_not_available(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SeatNotAvailable, message)
    }

    /// Create a policy-block error.
    pub fn not_available(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAvailable, message)
    }

    /// Create an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external-service error.
    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns `true` when the error carries the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::with_source(ErrorKind::Validation, err.to_string(), err)
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Row not found"),
            other => Self::with_source(
                ErrorKind::Database,
                format!("Database error: {other}"),
                other,
            ),
        }
    }
}
