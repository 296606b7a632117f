use crate::config::{EnvReader, FallbackPolicy};
use crate::env::ReadEnv;
use crate::sink::DiagnosticSink;

/// A trait for types that can be constructed from environment variables.
///
/// Implementors read each field through the given [`EnvReader`], so the
/// reader's fallback policy decides what happens to missing or invalid
/// values and its sink receives the warnings.
///
/// # Implementation Guidelines
/// - Use UPPERCASE_WITH_UNDERSCORES variable names
/// - Take defaults from the type's `Default` implementation
/// - Document all environment variables used by the implementation
///
/// # Examples
/// ```
/// use service_bootstrap::{EnvReader, FromEnv, ReadEnv, DiagnosticSink};
///
/// struct HttpConfig {
///     port: u16,
/// }
///
/// impl FromEnv for HttpConfig {
///     fn from_reader<S: DiagnosticSink, E: ReadEnv>(reader: &EnvReader<S, E>) -> Self {
///         Self {
///             port: reader.read_parsed("HTTP_PORT", 8080),
///         }
///     }
/// }
///
/// let config = HttpConfig::from_env();
/// assert!(config.port > 0);
/// ```
pub trait FromEnv: Sized {
    /// Builds the value from variables read through `reader`.
    fn from_reader<S: DiagnosticSink, E: ReadEnv>(reader: &EnvReader<S, E>) -> Self;

    /// Builds the value from the process environment, falling back to
    /// defaults with `tracing` warnings.
    fn from_env() -> Self {
        Self::from_reader(&EnvReader::new(FallbackPolicy::UseDefault))
    }
}
