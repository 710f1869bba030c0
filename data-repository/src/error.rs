//! Crate-level errors for configuration and logging setup
//!
//! Repository and store failures have their own types,
//! [`RepositoryError`](crate::repository::RepositoryError) and
//! [`StoreError`](crate::repository::StoreError).

use thiserror::Error;

/// Result type alias using the crate's error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while setting up the crate's ambient services
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Tracing subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}
