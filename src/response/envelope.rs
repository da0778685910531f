//! Uniform success/error response envelope

use std::future::{ready, Ready};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The uniform response shape: exactly one of `result` / `error`
///
/// # Example
///
/// ```rust
/// use restglue::response::Envelope;
/// use serde_json::json;
///
/// let ok = Envelope::result(json!({ "id": 1 }));
/// assert_eq!(serde_json::to_value(&ok).unwrap(), json!({ "result": { "id": 1 } }));
///
/// let err = Envelope::error(axum::http::StatusCode::NOT_FOUND, "Item not found");
/// assert!(err.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    /// Successful payload
    Result {
        /// The payload: scalar, mapping, or sequence
        result: Value,
    },
    /// Error payload
    Error {
        /// Code and message describing the failure
        error: ErrorBody,
    },
}

/// Error payload carried under the `error` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP status code
    pub code: u16,
    /// Human-readable message
    pub message: String,
}

impl Envelope {
    /// Wrap a successful payload
    pub fn result(value: impl Into<Value>) -> Self {
        Self::Result {
            result: value.into(),
        }
    }

    /// Build an error envelope from a status code and message
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorBody {
                code: status.as_u16(),
                message: message.into(),
            },
        }
    }

    /// Build an error envelope carrying the standard reason phrase
    ///
    /// # Example
    ///
    /// ```rust
    /// use restglue::response::Envelope;
    /// use axum::http::StatusCode;
    /// use serde_json::json;
    ///
    /// let envelope = Envelope::for_status(StatusCode::INTERNAL_SERVER_ERROR);
    /// assert_eq!(
    ///     serde_json::to_value(&envelope).unwrap(),
    ///     json!({ "error": { "code": 500, "message": "Internal Server Error" } })
    /// );
    /// ```
    #[must_use]
    pub fn for_status(status: StatusCode) -> Self {
        let message = status.canonical_reason().unwrap_or("Unknown Error");
        Self::error(status, message)
    }

    /// Whether this envelope carries an error
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Build a default handler for a specific status code
///
/// The handler answers with the given status and a JSON body
/// `{"error": {"code": <status>, "message": <reason phrase>}}`, intended
/// for registration as a router fallback or method-not-allowed handler.
///
/// # Example
///
/// ```rust,no_run
/// use axum::{http::StatusCode, Router};
/// use restglue::response::error_handler;
///
/// let app: Router = Router::new().fallback(error_handler(StatusCode::NOT_FOUND));
/// ```
pub fn error_handler(
    status: StatusCode,
) -> impl Fn() -> Ready<Response> + Clone + Send + Sync + 'static {
    move || ready((status, Json(Envelope::for_status(status))).into_response())
}
