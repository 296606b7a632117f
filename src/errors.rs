use thiserror::Error;

use crate::context::Done;

/// Errors that can occur while bootstrapping the PostgreSQL pool.
///
/// Every variant is returned to the caller; nothing here is retried.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The connection string variable could not be read.
    #[error("Unable to read database connection string: {0}")]
    Environment(#[from] ConfigError),

    /// The pool could not be built from the connection string.
    ///
    /// This covers malformed connection strings and anything else `sqlx`
    /// rejects before opening a connection.
    #[error("Unable to create database pool: {0}")]
    Construction(#[source] sqlx::Error),

    /// The liveness round trip failed (network, authentication, acquire timeout).
    #[error("Unable to ping database: {0}")]
    Ping(#[source] sqlx::Error),

    /// The caller's context was cancelled while the liveness check was running.
    #[error("Database liveness check cancelled")]
    Cancelled,

    /// The caller's context deadline elapsed before the liveness check finished.
    #[error("Database liveness check deadline exceeded")]
    DeadlineExceeded,
}

impl From<Done> for DatabaseError {
    fn from(done: Done) -> Self {
        match done {
            Done::Cancelled => DatabaseError::Cancelled,
            Done::DeadlineExceeded => DatabaseError::DeadlineExceeded,
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Represents errors that occur while loading or parsing the .env file.
    #[error("DotEnv error: {0}")]
    DotEnvError(#[from] dotenvy::Error),

    /// A required environment variable was not found or was not valid Unicode.
    #[error("Environment variable not found: {0}")]
    EnvVarError(#[from] std::env::VarError),
}

/// Errors that can occur during environment setup.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// Indicates that the .env file could not be found in the current
    /// directory or any of its parents.
    #[error(".env file not found")]
    DotEnvNotFound,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised when installing the global `tracing` subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Unable to read RUST_LOG: {0}")]
    Env(#[source] std::env::VarError),

    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Failed to install tracing subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Reasons a duration string is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,

    #[error("negative duration {0:?} is not supported")]
    Negative(String),

    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration {0:?} is out of range")]
    Overflow(String),
}
