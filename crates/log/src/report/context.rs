//! Report context attached to error and panic reports
//!
//! # Thread-Local Storage
//!
//! The current context is stored in thread-local storage and is **not**
//! propagated across `.await` points in async runtimes with work-stealing.
//! Pass a context explicitly to [`PanicReportGuard`](crate::PanicReportGuard)
//! in that case.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Request-scoped data sent along with a report
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportContext {
    /// Request ID
    pub request_id: Option<String>,
    /// User ID
    pub user_id: Option<String>,
    /// Additional fields
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl ReportContext {
    /// Create a new empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set request ID
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Set user ID
    #[must_use]
    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    /// Add a field; values that fail to serialize are skipped
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    /// True when nothing is set
    pub fn is_empty(&self) -> bool {
        self.request_id.is_none() && self.user_id.is_none() && self.fields.is_empty()
    }

    /// Set as current context for this thread
    #[must_use]
    pub fn set_current(self) -> ContextGuard {
        CONTEXT.with(|ctx| {
            let old = ctx.replace(Arc::new(self));
            ContextGuard {
                old: Some(old),
                _not_send: PhantomData,
            }
        })
    }

    /// Get current context (cheap `Arc::clone`, no deep copy)
    #[inline]
    #[must_use]
    pub fn current() -> Arc<Self> {
        CONTEXT.with(|ctx| Arc::clone(&ctx.borrow()))
    }

    /// Run a closure with this context
    pub fn scope<R>(self, f: impl FnOnce() -> R) -> R {
        let _guard = self.set_current();
        f()
    }
}

thread_local! {
    static CONTEXT: RefCell<Arc<ReportContext>> = RefCell::new(Arc::new(ReportContext::default()));
}

/// RAII guard that restores the previous context on drop
///
/// `!Send`: restoring on another thread would clobber that thread's context.
#[derive(Debug)]
pub struct ContextGuard {
    old: Option<Arc<ReportContext>>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if let Some(old) = self.old.take() {
            CONTEXT.with(|ctx| {
                *ctx.borrow_mut() = old;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_restores_previous_context() {
        assert!(ReportContext::current().is_empty());

        ReportContext::new().with_request_id("outer").scope(|| {
            assert_eq!(ReportContext::current().request_id.as_deref(), Some("outer"));

            ReportContext::new().with_user_id("u-1").scope(|| {
                let current = ReportContext::current();
                assert_eq!(current.user_id.as_deref(), Some("u-1"));
                assert_eq!(current.request_id, None);
            });

            assert_eq!(ReportContext::current().request_id.as_deref(), Some("outer"));
        });

        assert!(ReportContext::current().is_empty());
    }

    #[test]
    fn test_context_is_thread_local() {
        let _guard = ReportContext::new().with_request_id("main").set_current();

        let seen = std::thread::spawn(|| ReportContext::current().request_id.clone())
            .join()
            .unwrap();

        assert_eq!(seen, None);
    }

    #[test]
    fn test_with_field_serializes_value() {
        let ctx = ReportContext::new().with_field("attempt", 3);
        assert_eq!(ctx.fields["attempt"], serde_json::json!(3));
    }
}
