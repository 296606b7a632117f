//! Startup and per-request helpers for backend services.
//!
//! | Concern | Entry points |
//! |---------|--------------|
//! | Typed env vars | [`EnvReader`], [`parse_env_duration`], [`parse_env_int`], [`parse_env_string`] |
//! | PostgreSQL bootstrap | [`database::connect`], [`database::connect_with`] |
//! | Trace ids | [`attach_trace_id`], [`TraceId`] |
//! | Diagnostics | [`DiagnosticSink`], [`TracingSink`], [`NoopSink`] |

pub mod config;
pub mod context;
pub mod database;
pub mod duration;
pub mod env;
pub mod errors;
pub mod logging;
pub mod sink;
pub mod trace;
pub mod traits;

pub use config::{
    load_dotenv, parse_env_duration, parse_env_int, parse_env_string, EnvReader, FallbackPolicy,
};
pub use context::{Context, Done};
pub use database::{PoolSettings, CONNECTION_STRING_VAR};
pub use env::{ReadEnv, SystemEnv};
pub use errors::{ConfigError, DatabaseError, DurationParseError, EnvironmentError, LoggingError};
pub use sink::{DiagnosticSink, Level, NoopSink, TracingSink};
pub use trace::{attach_trace_id, TraceId};
pub use traits::FromEnv;
