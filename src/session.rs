//! Request-scoped database session middleware
//!
//! [`SessionLayer`] opens a database session before the inner handler runs
//! and hands it to the handler through the request extensions as a
//! [`DbSession`] extractor. When the handler is done the layer settles the
//! session: commit on a success response when autocommit is enabled, close
//! on every exit path. An error response skips the commit but is still
//! closed, and the sqlx transaction backing [`SqlxSession`] rolls back on
//! drop, so no exit path can leak an open session.
//!
//! # Example
//!
//! ```rust,no_run
//! use restglue::prelude::*;
//! use sqlx::PgPool;
//!
//! async fn count_items(
//!     session: DbSession<SqlxSession>,
//! ) -> Result<Json<serde_json::Value>, ApiError> {
//!     let mut guard = session.lock().await;
//!     let conn = guard
//!         .as_mut()
//!         .and_then(|s| s.connection())
//!         .ok_or_else(ApiError::session_missing)?;
//!     let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
//!         .fetch_one(conn)
//!         .await?;
//!     Ok(Json(serde_json::json!({ "count": count })))
//! }
//!
//! # fn router(pool: PgPool) -> Router {
//! Router::new()
//!     .route("/items/count", get(count_items))
//!     .layer(SessionLayer::postgres(pool).with_autocommit(true))
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Request},
    response::{IntoResponse, Response},
};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use tower::{Layer, Service};

use crate::error::{Error, Result};
use crate::response::ApiError;

/// A request-scoped unit of work against the backing store
///
/// `close` must release the underlying resource and must be safe to call
/// after `commit`.
#[async_trait]
pub trait Session: Send + 'static {
    /// Commit the work held by this session.
    async fn commit(&mut self) -> Result<()>;

    /// Release the session. Uncommitted work is discarded.
    async fn close(&mut self) -> Result<()>;
}

/// Creates one [`Session`] per incoming request
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    /// The session type produced by this factory
    type Session: Session;

    /// Open a fresh session.
    async fn create(&self) -> Result<Self::Session>;
}

/// Session over a sqlx PostgreSQL transaction
///
/// One transaction per request; `close` rolls back whatever was not
/// committed and returns the connection to the pool.
pub struct SqlxSession {
    tx: Option<Transaction<'static, Postgres>>,
}

impl SqlxSession {
    fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Access the underlying connection for running queries
    ///
    /// Returns `None` once the session has been committed or closed.
    pub fn connection(&mut self) -> Option<&mut PgConnection> {
        self.tx.as_deref_mut()
    }
}

#[async_trait]
impl Session for SqlxSession {
    async fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit()
                .await
                .map_err(|e| Error::Session(format!("commit failed: {e}")))?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // A committed session has nothing left to release.
        if let Some(tx) = self.tx.take() {
            tx.rollback()
                .await
                .map_err(|e| Error::Session(format!("close failed: {e}")))?;
        }
        Ok(())
    }
}

/// Factory opening one transaction per request from a connection pool
#[derive(Clone)]
pub struct SqlxSessionFactory {
    pool: PgPool,
}

impl SqlxSessionFactory {
    /// Create a factory backed by the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionFactory for SqlxSessionFactory {
    type Session = SqlxSession;

    async fn create(&self) -> Result<SqlxSession> {
        let tx = self.pool.begin().await?;
        Ok(SqlxSession::new(tx))
    }
}

/// Cloneable handle to the request's session
///
/// The handle lives in the request extensions and doubles as an axum
/// extractor, so handlers receive the session as an explicit argument
/// instead of reading ambient request state. The middleware takes the
/// session back out of the handle after the handler returns; a handler
/// that called [`DbSession::take`] itself (to commit early, say) leaves
/// nothing for the middleware to settle.
pub struct DbSession<S> {
    inner: Arc<Mutex<Option<S>>>,
}

impl<S> Clone for DbSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> DbSession<S> {
    /// Wrap a session in a shareable handle
    ///
    /// Mostly useful for handler unit tests; [`SessionLayer`] does this
    /// for every request.
    pub fn new(session: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(session))),
        }
    }

    /// Lock the handle for query access
    pub async fn lock(&self) -> MutexGuard<'_, Option<S>> {
        self.inner.lock().await
    }

    /// Take ownership of the session, leaving the handle empty
    pub async fn take(&self) -> Option<S> {
        self.inner.lock().await.take()
    }
}

impl<St, S> FromRequestParts<St> for DbSession<S>
where
    St: Send + Sync,
    S: Send + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<DbSession<S>>()
            .cloned()
            .ok_or_else(ApiError::session_missing)
    }
}

/// Layer wrapping a service with session lifecycle management
pub struct SessionLayer<F> {
    factory: Arc<F>,
    autocommit: bool,
}

impl<F> Clone for SessionLayer<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            autocommit: self.autocommit,
        }
    }
}

impl<F: SessionFactory> SessionLayer<F> {
    /// Create a layer with autocommit disabled
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
            autocommit: false,
        }
    }

    /// Enable or disable commit-on-success
    #[must_use]
    pub fn with_autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }
}

impl SessionLayer<SqlxSessionFactory> {
    /// Convenience constructor over a PostgreSQL pool
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(SqlxSessionFactory::new(pool))
    }
}

impl<S, F> Layer<S> for SessionLayer<F> {
    type Service = SessionService<S, F>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            factory: Arc::clone(&self.factory),
            autocommit: self.autocommit,
        }
    }
}

/// Service produced by [`SessionLayer`]
pub struct SessionService<S, F> {
    inner: S,
    factory: Arc<F>,
    autocommit: bool,
}

impl<S: Clone, F> Clone for SessionService<S, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            factory: Arc::clone(&self.factory),
            autocommit: self.autocommit,
        }
    }
}

impl<S, F, B> Service<Request<B>> for SessionService<S, F>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Error: Send,
    S::Future: Send + 'static,
    F: SessionFactory,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        // Take the ready inner service, leave a clone in its place.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let factory = Arc::clone(&self.factory);
        let autocommit = self.autocommit;

        Box::pin(async move {
            let session = match factory.create().await {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!(error = %e, "failed to open database session");
                    return Ok(
                        ApiError::unavailable("database session unavailable").into_response()
                    );
                }
            };

            let handle = DbSession::new(session);
            req.extensions_mut().insert(handle.clone());

            let response = match inner.call(req).await {
                Ok(response) => response,
                Err(e) => {
                    // The inner service never produced a response; still
                    // release the session before propagating.
                    if let Some(mut session) = handle.take().await {
                        if let Err(close_err) = session.close().await {
                            tracing::warn!(error = %close_err, "failed to close database session");
                        }
                    }
                    return Err(e);
                }
            };

            if let Some(mut session) = handle.take().await {
                if autocommit && response.status().is_success() {
                    if let Err(e) = session.commit().await {
                        tracing::error!(error = %e, "failed to commit database session");
                        let _ = session.close().await;
                        return Ok(
                            ApiError::internal("failed to commit database session")
                                .into_response(),
                        );
                    }
                }
                if let Err(e) = session.close().await {
                    tracing::warn!(error = %e, "failed to close database session");
                }
            }

            Ok(response)
        })
    }
}
