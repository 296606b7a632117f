//! Access to environment variables behind a trait, so readers can be pointed
//! at an isolated map in tests instead of the process environment.

use std::env::VarError;

/// Source of environment variables.
///
/// Does **not** require `Send + Sync`. Add the bounds at your call site when
/// the source has to cross threads.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Result<String, VarError>;
}

impl<T: ReadEnv + ?Sized> ReadEnv for &T {
    fn var(&self, key: &str) -> Result<String, VarError> {
        (**self).var(key)
    }
}

/// Zero-sized type, delegates to `std::env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    #[inline]
    fn var(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use in_memory::InMemoryEnv;

#[cfg(any(test, feature = "test-support"))]
mod in_memory {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::env::VarError;
    use std::ffi::OsString;

    use super::ReadEnv;

    /// Won't touch the global process environment.
    ///
    /// All methods take `&self`; the map sits behind a `RefCell`. Values are
    /// kept as `OsString` so non-Unicode values surface as
    /// `VarError::NotUnicode`, like the real environment.
    #[derive(Debug, Default)]
    pub struct InMemoryEnv {
        vars: RefCell<HashMap<String, OsString>>,
    }

    impl InMemoryEnv {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
            let value: String = value.into();
            self.set_os(key, value);
        }

        pub fn set_os(&self, key: impl Into<String>, value: impl Into<OsString>) {
            self.vars.borrow_mut().insert(key.into(), value.into());
        }

        pub fn remove(&self, key: &str) {
            self.vars.borrow_mut().remove(key);
        }
    }

    impl ReadEnv for InMemoryEnv {
        fn var(&self, key: &str) -> Result<String, VarError> {
            match self.vars.borrow().get(key) {
                Some(value) => value.clone().into_string().map_err(VarError::NotUnicode),
                None => Err(VarError::NotPresent),
            }
        }
    }
}
