//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::{
    config::LoggingConfig,
    error::{Error, Result},
};

/// Install a global `fmt` subscriber filtered by `config.level`
///
/// An unparsable level falls back to `info`. Returns [`Error::Logging`] when a
/// global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    installed.map_err(|e| Error::Logging(e.to_string()))?;

    tracing::info!(level = %config.level, json = config.json, "Tracing initialized");

    Ok(())
}
