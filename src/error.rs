//! Crate-level error types
//!
//! These cover configuration, connection, and session plumbing failures.
//! Errors that are meant to reach an HTTP client as a JSON envelope live in
//! [`crate::response::ApiError`] instead.

use thiserror::Error;

/// Result type alias defaulting to the crate error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the glue layers themselves
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Database driver error
    #[error("Database error: {0}")]
    Database(Box<sqlx::Error>),

    /// Session lifecycle error (create, commit, or close failed)
    #[error("Session error: {0}")]
    Session(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// Boxed to keep the enum small; figment and sqlx errors are large.
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(Box::new(err))
    }
}
