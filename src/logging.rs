use std::env::VarError;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::errors::LoggingError;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global `tracing` subscriber: human-readable output filtered by
/// `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
///
/// Fails if `RUST_LOG` is not valid Unicode, is not a valid filter, or a
/// subscriber is already set.
pub fn setup() -> Result<(), LoggingError> {
    let filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()?;

    Ok(())
}

fn build_filter(directives: Result<String, VarError>) -> Result<EnvFilter, LoggingError> {
    match directives {
        Ok(directives) => Ok(EnvFilter::try_new(directives)?),
        Err(VarError::NotPresent) => Ok(EnvFilter::try_new(DEFAULT_FILTER)?),
        Err(e) => Err(LoggingError::Env(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_setup_reports_error() {
        // Another test may have installed a subscriber first; either way the
        // second call in this test must fail.
        let _ = setup();
        assert!(matches!(setup(), Err(LoggingError::Install(_))));
    }

    #[test]
    fn test_unset_filter_uses_default() {
        assert!(build_filter(Err(VarError::NotPresent)).is_ok());
        assert!(build_filter(Ok("service_bootstrap=debug".to_string())).is_ok());
    }

    #[test]
    fn test_invalid_filter_is_reported() {
        assert!(matches!(
            build_filter(Ok("service_bootstrap=loudest".to_string())),
            Err(LoggingError::Filter(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_filter_is_reported() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let garbled = OsString::from_vec(vec![0x69, 0x6e, 0xff]);
        assert!(matches!(
            build_filter(Err(VarError::NotUnicode(garbled))),
            Err(LoggingError::Env(VarError::NotUnicode(_)))
        ));
    }
}
