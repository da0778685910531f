//! HTTP-facing error type with envelope rendering
//!
//! [`ApiError`] is what handlers propagate with `?`. Database driver
//! errors are translated here: a "no row matched" signal becomes an HTTP
//! 404 with a fixed message, everything else becomes an opaque 500. Errors
//! of any other type are not intercepted by this module.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::Envelope;

/// An error that renders as the JSON error envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status to answer with
    pub status: StatusCode,
    /// Message carried in the envelope
    pub message: String,
}

impl ApiError {
    /// Create an error with an explicit status and message
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// HTTP 404 with the fixed not-found message
    ///
    /// # Example
    ///
    /// ```rust
    /// use restglue::response::ApiError;
    ///
    /// let error = ApiError::not_found();
    /// assert_eq!(error.status.as_u16(), 404);
    /// assert_eq!(error.message, "Item not found");
    /// ```
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Item not found")
    }

    /// HTTP 400
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// HTTP 500
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// HTTP 503
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// HTTP 500 raised when a handler asks for a session no layer provided
    #[must_use]
    pub fn session_missing() -> Self {
        Self::internal("database session not available")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            // The driver's "unique lookup matched zero rows" signal.
            sqlx::Error::RowNotFound => Self::not_found(),
            other => {
                tracing::error!(error = %other, "database error");
                Self::internal("An internal error occurred")
            }
        }
    }
}

impl From<crate::error::Error> for ApiError {
    fn from(err: crate::error::Error) -> Self {
        match err {
            crate::error::Error::Database(inner) => Self::from(*inner),
            crate::error::Error::Session(message) => {
                tracing::error!(error = %message, "session error");
                Self::internal("An internal error occurred")
            }
            other => {
                tracing::error!(error = %other, "internal error");
                Self::internal("An internal error occurred")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = Envelope::error(self.status, self.message);
        (self.status, Json(envelope)).into_response()
    }
}

/// Translate "nothing matched" into the standard 404
///
/// # Example
///
/// ```rust
/// use restglue::response::{ApiError, OrNotFound};
///
/// let row: Option<i64> = None;
/// assert_eq!(row.or_not_found(), Err(ApiError::not_found()));
/// ```
pub trait OrNotFound<T> {
    /// Unwrap the value or produce [`ApiError::not_found`].
    fn or_not_found(self) -> Result<T, ApiError>;
}

impl<T> OrNotFound<T> for Option<T> {
    fn or_not_found(self) -> Result<T, ApiError> {
        self.ok_or_else(ApiError::not_found)
    }
}

impl<T> OrNotFound<T> for Result<Option<T>, sqlx::Error> {
    fn or_not_found(self) -> Result<T, ApiError> {
        self.map_err(ApiError::from)?.or_not_found()
    }
}
