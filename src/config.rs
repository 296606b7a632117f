//! Typed reads of environment variables with a fallback policy.
//!
//! [`EnvReader`] is the single implementation; the `parse_env_*` free
//! functions are shorthands for a reader in [`FallbackPolicy::UseDefault`]
//! mode with a caller-supplied sink.

use std::fmt::Display;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::time::Duration;

use crate::duration::{format_duration, parse_duration};
use crate::env::{ReadEnv, SystemEnv};
use crate::errors::{ConfigError, EnvironmentError};
use crate::sink::{DiagnosticSink, Level, TracingSink};

/// Exit status used when a read fails under [`FallbackPolicy::Abort`].
pub const ABORT_EXIT_CODE: i32 = 1;

/// What a reader does when a variable is unset, empty (strings only) or
/// fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Emit a warning and return the caller's default.
    UseDefault,
    /// Emit a fatal diagnostic and terminate the whole process.
    ///
    /// Only meant for configuration the service cannot start without.
    Abort,
}

/// Reads typed values from environment variables.
///
/// Built once with a [`FallbackPolicy`]; the sink defaults to
/// [`TracingSink`] and the source to the process environment.
///
/// ```
/// use std::time::Duration;
/// use service_bootstrap::{EnvReader, FallbackPolicy, NoopSink};
///
/// let reader = EnvReader::new(FallbackPolicy::UseDefault).with_sink(NoopSink);
/// let timeout = reader.read_duration("SERVICE_BOOTSTRAP_DOC_TIMEOUT", Duration::from_secs(30));
/// assert_eq!(timeout, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct EnvReader<S = TracingSink, E = SystemEnv> {
    policy: FallbackPolicy,
    sink: S,
    env: E,
}

impl EnvReader {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self {
            policy,
            sink: TracingSink,
            env: SystemEnv,
        }
    }
}

impl<S, E> EnvReader<S, E> {
    pub fn with_sink<T: DiagnosticSink>(self, sink: T) -> EnvReader<T, E> {
        EnvReader {
            policy: self.policy,
            sink,
            env: self.env,
        }
    }

    pub fn with_env<F: ReadEnv>(self, env: F) -> EnvReader<S, F> {
        EnvReader {
            policy: self.policy,
            sink: self.sink,
            env,
        }
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: DiagnosticSink, E: ReadEnv> EnvReader<S, E> {
    /// Reads `name` as a duration such as `5s` or `1m30s`.
    pub fn read_duration(&self, name: &str, default: Duration) -> Duration {
        let value = match self.env.var(name) {
            Ok(value) => value,
            Err(e) => return self.fall_back(name, default, &format_duration(default), &e),
        };

        match parse_duration(&value) {
            Ok(duration) => {
                self.resolved(name, &value);
                duration
            }
            Err(e) => self.fall_back(name, default, &format_duration(default), &e),
        }
    }

    /// Reads `name` as a base-10 integer. Surrounding whitespace is rejected.
    pub fn read_int(&self, name: &str, default: i64) -> i64 {
        self.read_parsed(name, default)
    }

    /// Reads `name` as any [`FromStr`] type.
    pub fn read_parsed<T>(&self, name: &str, default: T) -> T
    where
        T: FromStr + Display,
        T::Err: Display,
    {
        let value = match self.env.var(name) {
            Ok(value) => value,
            Err(e) => {
                let shown = default.to_string();
                return self.fall_back(name, default, &shown, &e);
            }
        };

        match value.parse::<T>() {
            Ok(parsed) => {
                self.resolved(name, &value);
                parsed
            }
            Err(e) => {
                let shown = default.to_string();
                self.fall_back(name, default, &shown, &e)
            }
        }
    }

    /// Reads `name` as a string. An empty value counts as missing.
    pub fn read_string(&self, name: &str, default: &str) -> String {
        match self.env.var(name) {
            Ok(value) if value.is_empty() => {
                self.fall_back(name, default.to_string(), &default, &"variable is empty")
            }
            Ok(value) => {
                self.resolved(name, &value);
                value
            }
            Err(e) => self.fall_back(name, default.to_string(), &default, &e),
        }
    }

    fn resolved(&self, name: &str, value: &str) {
        self.sink.emit(
            Level::Debug,
            "Got environment variable",
            &[("variable", &name), ("value", &value)],
        );
    }

    fn fall_back<T>(&self, name: &str, default: T, shown: &dyn Display, cause: &dyn Display) -> T {
        match self.policy {
            FallbackPolicy::UseDefault => {
                self.sink.emit(
                    Level::Warn,
                    "Could not read environment variable, using default",
                    &[("variable", &name), ("default", shown), ("error", cause)],
                );
                default
            }
            FallbackPolicy::Abort => {
                self.sink.emit(
                    Level::Fatal,
                    "Could not read required environment variable",
                    &[("variable", &name), ("error", cause)],
                );
                process::exit(ABORT_EXIT_CODE)
            }
        }
    }
}

/// Reads `name` as a duration, falling back to `default` with a warning.
pub fn parse_env_duration(name: &str, default: Duration, sink: impl DiagnosticSink) -> Duration {
    EnvReader::new(FallbackPolicy::UseDefault)
        .with_sink(sink)
        .read_duration(name, default)
}

/// Reads `name` as an integer, falling back to `default` with a warning.
pub fn parse_env_int(name: &str, default: i64, sink: impl DiagnosticSink) -> i64 {
    EnvReader::new(FallbackPolicy::UseDefault)
        .with_sink(sink)
        .read_int(name, default)
}

/// Reads `name` as a string, falling back to `default` with a warning when
/// the variable is unset or empty.
pub fn parse_env_string(name: &str, default: &str, sink: impl DiagnosticSink) -> String {
    EnvReader::new(FallbackPolicy::UseDefault)
        .with_sink(sink)
        .read_string(name, default)
}

/// Reads a variable that must be present, without any fallback.
pub fn required_var<E: ReadEnv>(env: &E, name: &str) -> Result<String, ConfigError> {
    env.var(name).map_err(ConfigError::from)
}

/// Loads `.env` from the current directory or its parents into the process
/// environment. Variables already set are left alone.
pub fn load_dotenv() -> Result<PathBuf, EnvironmentError> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(path),
        Err(e) if e.not_found() => Err(EnvironmentError::DotEnvNotFound),
        Err(e) => Err(ConfigError::from(e).into()),
    }
}
