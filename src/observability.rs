//! Tracing initialization

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

/// Initialize tracing with a JSON formatter
///
/// The filter comes from the configured log level; an invalid directive
/// falls back to `info`. Returns an error if a global subscriber is
/// already installed.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.service.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| crate::error::Error::Internal(format!("failed to install subscriber: {e}")))?;

    tracing::info!(service = %config.service.name, "tracing initialized");

    Ok(())
}
