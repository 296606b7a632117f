//! Request-scoped context: typed values, cancellation and a deadline.
//!
//! A [`Context`] is immutable. Every `with_*` call returns a new context
//! layered on top of the receiver, which stays as it was. Values are keyed by
//! their Rust type, so a private newtype is a collision-free key.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Why a context finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Done {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Done::Cancelled => f.write_str("context cancelled"),
            Done::DeadlineExceeded => f.write_str("context deadline exceeded"),
        }
    }
}

#[derive(Clone)]
pub struct Context {
    inner: Arc<Layer>,
}

struct Layer {
    parent: Option<Context>,
    value: Option<Box<dyn Any + Send + Sync>>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// The root context: no values, never cancelled, no deadline.
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Layer {
                parent: None,
                value: None,
                cancel: CancellationToken::new(),
                deadline: None,
            }),
        }
    }

    fn derive(
        &self,
        value: Option<Box<dyn Any + Send + Sync>>,
        cancel: CancellationToken,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            inner: Arc::new(Layer {
                parent: Some(self.clone()),
                value,
                cancel,
                deadline,
            }),
        }
    }

    /// Returns a context carrying `value`, retrievable with [`Context::value`].
    /// A value of the same type already in the chain is shadowed, not replaced.
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        self.derive(
            Some(Box::new(value)),
            self.inner.cancel.clone(),
            self.inner.deadline,
        )
    }

    /// The nearest value of type `T` in the chain.
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        let mut layer = Some(self);
        while let Some(ctx) = layer {
            if let Some(value) = ctx.inner.value.as_ref().and_then(|v| v.downcast_ref::<T>()) {
                return Some(value);
            }
            layer = ctx.inner.parent.as_ref();
        }
        None
    }

    /// Returns a child context and the token that cancels it.
    ///
    /// Cancelling the parent also cancels the child; cancelling the child
    /// leaves the parent untouched.
    pub fn with_cancel(&self) -> (Self, CancellationToken) {
        let token = self.inner.cancel.child_token();
        let ctx = self.derive(None, token.clone(), self.inner.deadline);
        (ctx, token)
    }

    /// Returns a child context that finishes at `deadline`, or earlier if the
    /// receiver already has an earlier deadline.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.inner.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        self.derive(None, self.inner.cancel.clone(), Some(deadline))
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Non-blocking check: `Some` once the context is cancelled or past its deadline.
    pub fn err(&self) -> Option<Done> {
        if self.inner.cancel.is_cancelled() {
            return Some(Done::Cancelled);
        }
        match self.inner.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(Done::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    ///
    /// Resolves on the first poll if that has already happened.
    pub async fn done(&self) -> Done {
        if let Some(reason) = self.err() {
            return reason;
        }

        match self.inner.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.inner.cancel.cancelled() => Done::Cancelled,
                _ = time::sleep_until(deadline) => Done::DeadlineExceeded,
            },
            None => {
                self.inner.cancel.cancelled().await;
                Done::Cancelled
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.inner.cancel.is_cancelled())
            .field("deadline", &self.inner.deadline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct UserId(u32);

    #[derive(Debug, PartialEq)]
    struct Tenant(&'static str);

    #[test]
    fn test_values_are_layered() {
        let root = Context::background();
        let with_user = root.with_value(UserId(1));
        let with_tenant = with_user.with_value(Tenant("acme"));

        assert_eq!(root.value::<UserId>(), None);
        assert_eq!(with_user.value::<UserId>(), Some(&UserId(1)));
        assert_eq!(with_user.value::<Tenant>(), None);
        assert_eq!(with_tenant.value::<UserId>(), Some(&UserId(1)));
        assert_eq!(with_tenant.value::<Tenant>(), Some(&Tenant("acme")));
    }

    #[test]
    fn test_nearest_value_wins() {
        let outer = Context::background().with_value(UserId(1));
        let inner = outer.with_value(UserId(2));

        assert_eq!(inner.value::<UserId>(), Some(&UserId(2)));
        assert_eq!(outer.value::<UserId>(), Some(&UserId(1)));
    }

    #[tokio::test]
    async fn test_cancel_propagates_downwards_only() {
        let root = Context::background();
        let (parent, parent_token) = root.with_cancel();
        let (child, child_token) = parent.with_cancel();
        let grandchild = child.with_value(UserId(3));

        child_token.cancel();
        assert_eq!(child.err(), Some(Done::Cancelled));
        assert_eq!(grandchild.done().await, Done::Cancelled);
        assert_eq!(parent.err(), None);

        parent_token.cancel();
        assert_eq!(parent.done().await, Done::Cancelled);
        assert_eq!(root.err(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_finishes_context() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.err(), None);

        let started = Instant::now();
        assert_eq!(ctx.done().await, Done::DeadlineExceeded);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(ctx.err(), Some(Done::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_earliest_deadline_is_kept() {
        let short = Context::background().with_timeout(Duration::from_secs(1));
        let longer = short.with_timeout(Duration::from_secs(60));
        assert_eq!(longer.deadline(), short.deadline());

        let long = Context::background().with_timeout(Duration::from_secs(60));
        let shorter = long.with_timeout(Duration::from_secs(1));
        assert!(shorter.deadline() < long.deadline());
    }

    #[tokio::test]
    async fn test_expired_deadline_resolves_immediately() {
        let ctx = Context::background().with_timeout(Duration::ZERO);
        assert_eq!(ctx.done().await, Done::DeadlineExceeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wins_over_pending_deadline() {
        let (ctx, token) = Context::background()
            .with_timeout(Duration::from_secs(30))
            .with_cancel();

        let waiter = tokio::spawn(async move { ctx.done().await });
        token.cancel();
        assert_eq!(waiter.await.unwrap(), Done::Cancelled);
    }
}
