#![forbid(unsafe_code)]

//! Stream operators.
//!
//! Every operator is a method on [`Stream`](crate::Stream) that consumes the
//! source and returns a new cold stream. Subscribing to the result
//! subscribes to the source; unsubscribing from the result unsubscribes
//! from the source and from any inner stream the operator started.
//!
//! | Group | Operators |
//! |-------|-----------|
//! | transform | `map`, `filter`, `tap`, `map_err`, `start_with`, `distinct_until_changed`, `take` |
//! | recovery | `catch_error`, `retry`, `finalize` |
//! | multicast | `share_replay` |
//! | flattening | `concat_map`, `merge_map`, `switch_map`, `exhaust_map` |
//! | combination | `Stream::concat`, `Stream::merge` |
//! | logging | `debug` |
//!
//! Custom operators are plain functions applied with
//! [`Stream::pipe`](crate::Stream::pipe).

mod combine;
mod debug;
mod flatten;
mod recovery;
mod share;
mod transform;

pub use debug::LogLevel;

use crate::notification::Observer;
use crate::subscriber::Subscriber;

/// Forwards into a downstream subscriber through per-signal hooks.
/// Completion is always forwarded as is.
pub(crate) struct Relay<U, F, N, R> {
    downstream: Subscriber<U, F>,
    on_next: N,
    on_error: R,
}

type ForwardError<U, F> = fn(&Subscriber<U, F>, F);

fn forward_error<U: 'static, F: 'static>(downstream: &Subscriber<U, F>, error: F) {
    downstream.error(error);
}

pub(crate) fn pass<U: 'static, F: 'static>(downstream: &Subscriber<U, F>, value: U) {
    downstream.next(value);
}

impl<U: 'static, F: 'static, N> Relay<U, F, N, ForwardError<U, F>> {
    /// Hook values; errors pass through unchanged.
    pub(crate) fn new<T>(downstream: &Subscriber<U, F>, on_next: N) -> Self
    where
        N: FnMut(&Subscriber<U, F>, T),
    {
        Self {
            downstream: downstream.clone(),
            on_next,
            on_error: forward_error::<U, F>,
        }
    }
}

impl<U: 'static, F: 'static, N, R> Relay<U, F, N, R> {
    pub(crate) fn with_error<T, E>(downstream: &Subscriber<U, F>, on_next: N, on_error: R) -> Self
    where
        N: FnMut(&Subscriber<U, F>, T),
        R: FnMut(&Subscriber<U, F>, E),
    {
        Self {
            downstream: downstream.clone(),
            on_next,
            on_error,
        }
    }
}

impl<T, E, U: 'static, F: 'static, N, R> Observer<T, E> for Relay<U, F, N, R>
where
    N: FnMut(&Subscriber<U, F>, T),
    R: FnMut(&Subscriber<U, F>, E),
{
    fn next(&mut self, value: T) {
        (self.on_next)(&self.downstream, value);
    }

    fn error(&mut self, error: E) {
        (self.on_error)(&self.downstream, error);
    }

    fn complete(&mut self) {
        self.downstream.complete();
    }
}
