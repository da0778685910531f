//! Response normalization middleware
//!
//! [`JsonNormalizeLayer`] buffers each response body and reshapes it into
//! the uniform envelope:
//!
//! - a JSON object whose key set is exactly `{result}`, `{error}`, or
//!   `{result, pagination}` passes through unchanged;
//! - any other JSON object, and every JSON array, is wrapped as
//!   `{"result": ...}`;
//! - JSON scalars and non-JSON bodies pass through untouched;
//! - error-status responses are rewritten as `{"error": <body>}` where the
//!   body is the original JSON object, or `{"message": <text>, "code":
//!   <status>}` for anything else, keeping the status and headers and
//!   forcing `Content-Type: application/json`.
//!
//! The layer assumes API-sized JSON responses; bodies are buffered in full
//! before reshaping.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::{IntoResponse, Response},
};
use http::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::{json, Map, Value};
use tower::{Layer, Service};

use super::ApiError;

/// Layer applying envelope normalization to every response
#[derive(Debug, Clone, Default)]
pub struct JsonNormalizeLayer;

impl JsonNormalizeLayer {
    /// Create the layer
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for JsonNormalizeLayer {
    type Service = JsonNormalizeService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        JsonNormalizeService { inner }
    }
}

/// Service produced by [`JsonNormalizeLayer`]
#[derive(Debug, Clone)]
pub struct JsonNormalizeService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for JsonNormalizeService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = inner.call(req).await?;
            Ok(reshape(response).await)
        })
    }
}

/// Apply the success-path wrapping rules to a decoded JSON value
///
/// # Example
///
/// ```rust
/// use restglue::response::normalize_value;
/// use serde_json::json;
///
/// assert_eq!(
///     normalize_value(json!({ "foo": "bar" })),
///     json!({ "result": { "foo": "bar" } })
/// );
/// assert_eq!(
///     normalize_value(json!({ "result": "foobar" })),
///     json!({ "result": "foobar" })
/// );
/// assert_eq!(normalize_value(json!(5)), json!(5));
/// ```
pub fn normalize_value(value: Value) -> Value {
    if needs_wrap(&value) {
        json!({ "result": value })
    } else {
        value
    }
}

fn needs_wrap(value: &Value) -> bool {
    match value {
        Value::Object(map) => !is_envelope_keys(map),
        Value::Array(_) => true,
        _ => false,
    }
}

fn is_envelope_keys(map: &Map<String, Value>) -> bool {
    match map.len() {
        1 => map.contains_key("result") || map.contains_key("error"),
        2 => map.contains_key("result") && map.contains_key("pagination"),
        _ => false,
    }
}

async fn reshape(response: Response) -> Response {
    let status = response.status();
    let (mut parts, body) = response.into_parts();

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to buffer response body");
            return ApiError::internal("failed to buffer response body").into_response();
        }
    };

    if status.is_client_error() || status.is_server_error() {
        let error_body = match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => {
                if map.len() == 1 && map.contains_key("error") {
                    // Already enveloped; only make sure the content type
                    // says JSON.
                    set_json_content_type(&mut parts.headers);
                    return Response::from_parts(parts, Body::from(bytes));
                }
                Value::Object(map)
            }
            Ok(Value::String(text)) => json!({ "message": text, "code": status.as_u16() }),
            _ => json!({
                "message": String::from_utf8_lossy(&bytes).into_owned(),
                "code": status.as_u16(),
            }),
        };
        return rebuild(parts, json!({ "error": error_body }));
    }

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) if needs_wrap(&value) => rebuild(parts, json!({ "result": value })),
        // Envelope, scalar, or non-JSON body: leave it alone.
        _ => Response::from_parts(parts, Body::from(bytes)),
    }
}

fn rebuild(mut parts: http::response::Parts, value: Value) -> Response {
    // Serializing a serde_json::Value cannot fail.
    let body = serde_json::to_vec(&value).unwrap_or_default();
    parts.headers.remove(CONTENT_LENGTH);
    set_json_content_type(&mut parts.headers);
    Response::from_parts(parts, Body::from(body))
}

fn set_json_content_type(headers: &mut HeaderMap) {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
}
