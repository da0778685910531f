//! # restglue
//!
//! Small middleware building blocks for JSON-over-HTTP axum services.
//!
//! Each piece is an independent adapter between one library's behavior and
//! plain JSON conventions:
//!
//! - **Session lifecycle**: [`session::SessionLayer`] opens a request-scoped
//!   database session before the handler runs, commits on success when
//!   autocommit is enabled, and closes on every exit path.
//! - **Not-found translation**: [`response::ApiError`] maps the driver's
//!   "no row matched" signal to an HTTP 404 with a fixed message.
//! - **Response normalization**: [`response::JsonNormalizeLayer`] reshapes
//!   handler output into a uniform `{"result": ...}` / `{"error": ...}`
//!   envelope, and [`response::error_handler`] builds JSON default handlers
//!   for framework-level errors.
//! - **Serialization**: [`serialize::JsonRecord`] walks a record's declared
//!   schema to produce a JSON-safe mapping, with opt-in relationship
//!   expansion.
//! - **Pagination**: [`pagination::Page`] slices a query into pages and
//!   renders them through the response envelope.
//!
//! ## Example
//!
//! ```rust,no_run
//! use restglue::prelude::*;
//!
//! async fn ping() -> Json<serde_json::Value> {
//!     Json(serde_json::json!({ "ping": "pong" }))
//! }
//!
//! # async fn run() -> restglue::error::Result<()> {
//! let config = Config::load()?;
//! init_tracing(&config)?;
//!
//! let app: Router = Router::new()
//!     .route("/ping", get(ping))
//!     .fallback(error_handler(StatusCode::NOT_FOUND))
//!     .layer(JsonNormalizeLayer::new());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod observability;
pub mod pagination;
pub mod response;
pub mod serialize;
pub mod session;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        Config, DatabaseConfig, PaginationConfig, ServiceConfig, SessionConfig,
    };
    pub use crate::error::{Error, Result};
    pub use crate::observability::init_tracing;
    pub use crate::pagination::{
        Page, PageMeta, PageParams, PageQuery, PageResponse, DEFAULT_PER_PAGE,
    };
    pub use crate::response::{
        error_handler, ApiError, Envelope, ErrorBody, JsonNormalizeLayer, OrNotFound,
    };
    pub use crate::serialize::{FieldDef, FieldKind, FieldValue, JsonRecord};
    pub use crate::session::{
        DbSession, Session, SessionFactory, SessionLayer, SqlxSession, SqlxSessionFactory,
    };

    pub use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, HeaderValue, StatusCode},
        response::{IntoResponse, Json, Response},
        routing::{delete, get, patch, post, put},
        Extension, Router,
    };

    pub use serde::{Deserialize, Serialize};
    pub use serde_json::json;

    // Re-export tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // Re-export async-trait for implementing the session and query traits
    pub use async_trait::async_trait;

    // Re-export time utilities used by record serialization
    pub use chrono::{DateTime, NaiveDateTime, Utc};
}
