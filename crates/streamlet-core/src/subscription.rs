#![forbid(unsafe_code)]

//! Cancellation handles.
//!
//! A [`Subscription`] is the caller's side of one registration. It is
//! type-erased (no `T`/`E` parameters), cheap to clone, and idempotent:
//! cancelling twice, or cancelling after the stream already terminated, is a
//! no-op.
//!
//! [`SubscriptionGuard`] adds RAII on top: dropping the guard cancels.

use std::rc::Rc;

/// Anything that can be closed from a [`Subscription`].
pub(crate) trait Closeable {
    fn close(&self);
    fn is_closed(&self) -> bool;
}

/// Handle to one subscriber's registration.
#[derive(Clone)]
pub struct Subscription {
    target: Option<Rc<dyn Closeable>>,
}

impl Subscription {
    pub(crate) fn from_target(target: Rc<dyn Closeable>) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// A handle that is already closed.
    #[must_use]
    pub fn empty() -> Self {
        Self { target: None }
    }

    /// Cancel the registration. The observer is not called again.
    pub fn unsubscribe(&self) {
        if let Some(target) = &self.target {
            target.close();
        }
    }

    /// Whether the registration is gone (cancelled or terminated).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.target.as_ref().is_none_or(|target| target.is_closed())
    }

    /// Convert into a guard that unsubscribes when dropped.
    #[must_use]
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard { inner: Some(self) }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// RAII guard: dropping it cancels the wrapped [`Subscription`].
#[must_use = "dropping the guard unsubscribes immediately"]
pub struct SubscriptionGuard {
    inner: Option<Subscription>,
}

impl SubscriptionGuard {
    /// Give up the guard without cancelling.
    pub fn release(mut self) -> Subscription {
        self.inner.take().unwrap_or_else(Subscription::empty)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.as_ref().is_none_or(Subscription::is_closed)
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.unsubscribe();
        }
    }
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("closed", &self.is_closed())
            .finish()
    }
}
