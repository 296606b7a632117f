//! Leveled, structured diagnostics.
//!
//! Helpers in this crate never log directly. They hand every message to a
//! [`DiagnosticSink`], which is [`TracingSink`] unless the caller picks
//! something else. [`NoopSink`] silences everything.

use std::fmt;
use std::sync::Arc;

use tracing::field::display;
use tracing::{debug, error, info, warn};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    /// Emitted right before the process is terminated.
    Fatal,
}

/// Structured key/value pairs attached to a diagnostic.
pub type Fields<'a> = [(&'static str, &'a dyn fmt::Display)];

/// Destination for diagnostics.
///
/// Implementations must not terminate the process themselves, even for
/// [`Level::Fatal`]; the caller that emitted the fatal message does that.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, level: Level, message: &str, fields: &Fields<'_>);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn emit(&self, level: Level, message: &str, fields: &Fields<'_>) {
        (**self).emit(level, message, fields)
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Box<S> {
    fn emit(&self, level: Level, message: &str, fields: &Fields<'_>) {
        (**self).emit(level, message, fields)
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Arc<S> {
    fn emit(&self, level: Level, message: &str, fields: &Fields<'_>) {
        (**self).emit(level, message, fields)
    }
}

/// Forwards diagnostics to the `tracing` macros.
///
/// `tracing` needs field names at compile time. The keys this crate emits
/// (`variable`, `value`, `default`, `error`, `max_connections`) are recorded
/// as fields of the same name; any other key is rendered into a single
/// `fields` value as `key=value` pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! forward {
    ($event:ident, $known:ident, $message:ident $(, $key:ident = $val:expr)*) => {
        $event!(
            $($key = $val,)*
            variable = $known.variable.map(display),
            value = $known.value.map(display),
            default = $known.default.map(display),
            error = $known.error.map(display),
            max_connections = $known.max_connections.map(display),
            fields = (!$known.rest.is_empty()).then(|| display(Rendered(&$known.rest))),
            "{}",
            $message
        )
    };
}

impl DiagnosticSink for TracingSink {
    fn emit(&self, level: Level, message: &str, fields: &Fields<'_>) {
        let known = KnownFields::split(fields);
        match level {
            Level::Debug => forward!(debug, known, message),
            Level::Info => forward!(info, known, message),
            Level::Warn => forward!(warn, known, message),
            Level::Error => forward!(error, known, message),
            Level::Fatal => forward!(error, known, message, fatal = true),
        }
    }
}

#[derive(Default)]
struct KnownFields<'a> {
    variable: Option<&'a dyn fmt::Display>,
    value: Option<&'a dyn fmt::Display>,
    default: Option<&'a dyn fmt::Display>,
    error: Option<&'a dyn fmt::Display>,
    max_connections: Option<&'a dyn fmt::Display>,
    rest: Vec<(&'static str, &'a dyn fmt::Display)>,
}

impl<'a> KnownFields<'a> {
    fn split(fields: &Fields<'a>) -> Self {
        let mut known = Self::default();
        for &(key, value) in fields {
            let slot = match key {
                "variable" => &mut known.variable,
                "value" => &mut known.value,
                "default" => &mut known.default,
                "error" => &mut known.error,
                "max_connections" => &mut known.max_connections,
                _ => {
                    known.rest.push((key, value));
                    continue;
                }
            };
            *slot = Some(value);
        }
        known
    }
}

/// Discards every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn emit(&self, _level: Level, _message: &str, _fields: &Fields<'_>) {}
}

struct Rendered<'a, 'b>(&'a Fields<'b>);

impl fmt::Display for Rendered<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::{Record, RecordingSink};

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use std::sync::Mutex;

    use super::{DiagnosticSink, Fields, Level};

    /// A diagnostic captured by [`RecordingSink`], with fields rendered to strings.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Record {
        pub level: Level,
        pub message: String,
        pub fields: Vec<(String, String)>,
    }

    impl Record {
        pub fn field(&self, key: &str) -> Option<&str> {
            self.fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Keeps every diagnostic in memory for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        records: Mutex<Vec<Record>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn records(&self) -> Vec<Record> {
            self.records
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }

        pub fn at(&self, level: Level) -> Vec<Record> {
            self.records()
                .into_iter()
                .filter(|r| r.level == level)
                .collect()
        }
    }

    impl DiagnosticSink for RecordingSink {
        fn emit(&self, level: Level, message: &str, fields: &Fields<'_>) {
            let record = Record {
                level,
                message: message.to_string(),
                fields: fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            };
            self.records
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(record);
        }
    }
}
