//! Error types for web handlers.
//!
//! [`AppError`] bridges [`BookingError`] and HTTP responses, implementing
//! Axum's `IntoResponse` trait.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use booking_core::BookingError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState<P>>) -> Result<Json<Booking>, AppError> {
///     let booking = state.service.get_booking(id).await?;
///     Ok(Json(booking))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Whether re-running the request may succeed
    retryable: bool,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            retryable: false,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Mark the error as retryable.
    #[must_use]
    pub const fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match &err {
            BookingError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND"),
            BookingError::Inactive { .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "INACTIVE")
            }
            BookingError::Mismatch { .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "PROVIDER_MISMATCH")
            }
            BookingError::Validation(_) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "VALIDATION_ERROR")
            }
            BookingError::DuplicateBooking => {
                Self::new(StatusCode::CONFLICT, message, "DUPLICATE_BOOKING")
            }
            BookingError::TimeConflict => Self::new(StatusCode::CONFLICT, message, "TIME_CONFLICT"),
            BookingError::InvalidState { .. } => {
                Self::new(StatusCode::CONFLICT, message, "INVALID_STATE")
            }
            BookingError::TooLateToCancel => {
                Self::new(StatusCode::CONFLICT, message, "TOO_LATE_TO_CANCEL")
            }
            BookingError::SlotInUse { .. } => Self::new(StatusCode::CONFLICT, message, "SLOT_IN_USE"),
            BookingError::CapacityExceeded => {
                Self::new(StatusCode::CONFLICT, message, "CAPACITY_EXCEEDED").retryable()
            }
            BookingError::Busy => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, message, "BUSY").retryable()
            }
            BookingError::Database(_) | BookingError::LockStore(_) | BookingError::Internal(_) => {
                Self::internal("An internal error occurred")
                    .with_source(anyhow::Error::new(err.clone()))
            }
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
    /// Present and `true` when the client may retry.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            retryable: self.retryable,
        };

        (self.status, Json(body)).into_response()
    }
}
