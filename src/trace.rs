//! Per-request trace identifiers.

use std::fmt;

use tracing::{info_span, Span};
use uuid::Uuid;

use crate::context::Context;

/// Random (v4) identifier correlating everything done for one request.
///
/// The type itself is the context key: retrieve it with
/// [`TraceId::from_context`] or `ctx.value::<TraceId>()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn from_context(ctx: &Context) -> Option<Self> {
        ctx.value::<Self>().copied()
    }

    /// A span tagged with this id, for instrumenting the request's work.
    pub fn span(&self) -> Span {
        info_span!("request", trace_id = %self.0)
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Returns a context derived from `ctx` carrying a freshly generated [`TraceId`].
///
/// `ctx` is left untouched.
pub fn attach_trace_id(ctx: &Context) -> Context {
    ctx.with_value(TraceId::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    #[test]
    fn test_attach_does_not_touch_input() {
        let root = Context::background();
        let traced = attach_trace_id(&root);

        assert!(TraceId::from_context(&root).is_none());
        let id = TraceId::from_context(&traced).unwrap();
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_two_attachments_differ() {
        let root = Context::background();
        let first = TraceId::from_context(&attach_trace_id(&root)).unwrap();
        let second = TraceId::from_context(&attach_trace_id(&root)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_reattaching_shadows_previous_id() {
        let first = attach_trace_id(&Context::background());
        let second = attach_trace_id(&first);
        assert_ne!(
            TraceId::from_context(&first),
            TraceId::from_context(&second)
        );
    }

    #[test]
    fn test_no_collisions_in_ten_thousand() {
        let root = Context::background();
        let ids: HashSet<TraceId> = (0..10_000)
            .map(|_| TraceId::from_context(&attach_trace_id(&root)).unwrap())
            .collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[tokio::test]
    async fn test_concurrent_attachments_are_unique() {
        let root = Context::background();
        let num_tasks = num_cpus::get() * 2;
        let per_task = 500;

        let handles: Vec<_> = (0..num_tasks)
            .map(|_| {
                let root = root.clone();
                tokio::spawn(async move {
                    (0..per_task)
                        .map(|_| TraceId::from_context(&attach_trace_id(&root)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(seen.insert(id), "duplicate trace id {}", id);
            }
        }
        assert_eq!(seen.len(), num_tasks * per_task);

        assert!(TraceId::from_context(&root).is_none());
    }

    #[test]
    fn test_display_matches_uuid() {
        let id = TraceId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
        let _entered = id.span().entered();
    }
}
