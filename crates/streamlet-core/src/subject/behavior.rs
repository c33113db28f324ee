#![forbid(unsafe_code)]

//! Latest-value subject.
//!
//! # Design
//!
//! [`BehaviorSubject<T, E>`] keeps the most recent value next to the
//! observer registry. Subscribing delivers that value first, then every
//! later push. The current value is readable without subscribing via
//! [`value`](BehaviorSubject::value).
//!
//! # Failure Modes
//!
//! - **Push after termination**: ignored; the stored value is left as it
//!   was when the subject terminated.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use crate::notification::{Notification, Observer};
use crate::stream::Stream;
use crate::subscriber::Subscriber;
use crate::subscription::Subscription;

use super::StreamState;
use super::hub::{Hub, Terminal};

/// Multicast subject that replays its current value to new subscribers.
///
/// Cloning a `BehaviorSubject` creates a new handle to the **same** value
/// and registry.
pub struct BehaviorSubject<T, E = Infallible> {
    hub: Hub<T, E>,
    current: Rc<RefCell<T>>,
}

impl<T, E> Clone for BehaviorSubject<T, E> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
            current: Rc::clone(&self.current),
        }
    }
}

impl<T: std::fmt::Debug, E> std::fmt::Debug for BehaviorSubject<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorSubject")
            .field("value", &self.current.borrow())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> BehaviorSubject<T, E> {
    /// Create a subject holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            hub: Hub::new(),
            current: Rc::new(RefCell::new(initial)),
        }
    }

    /// A clone of the current value.
    #[must_use]
    pub fn value(&self) -> T {
        self.current.borrow().clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.current.borrow())
    }

    /// Store `value` as current and push it to every subscriber.
    pub fn next(&self, value: T) {
        if !self.hub.is_active() {
            tracing::trace!("behavior subject: push after termination ignored");
            return;
        }
        *self.current.borrow_mut() = value.clone();
        self.hub.publish([Notification::Next(value)]);
    }

    /// Compute the next value from the current one and push it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.current.borrow());
        self.next(next);
    }

    pub fn error(&self, error: E) {
        if self.hub.finish(Terminal::Errored(error.clone())) {
            self.hub.publish([Notification::Error(error)]);
        }
    }

    pub fn complete(&self) {
        if self.hub.finish(Terminal::Completed) {
            self.hub.publish([Notification::Complete]);
        }
    }

    /// Read-only view: current value on subscribe, then every push.
    #[must_use]
    pub fn as_stream(&self) -> Stream<T, E> {
        let hub = self.hub.clone();
        let current = Rc::clone(&self.current);
        Stream::new(move |subscriber: Subscriber<T, E>| match hub.terminal() {
            Some(Terminal::Completed) => subscriber.complete(),
            Some(Terminal::Errored(error)) => subscriber.error(error),
            None => {
                let value = current.borrow().clone();
                hub.register(&subscriber);
                subscriber.next(value);
            }
        })
    }

    pub fn subscribe(&self, observer: impl Observer<T, E> + 'static) -> Subscription {
        self.as_stream().subscribe(observer)
    }

    #[must_use]
    pub fn state(&self) -> StreamState {
        self.hub.state()
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.hub.observer_count()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Observer<T, E> for BehaviorSubject<T, E> {
    fn next(&mut self, value: T) {
        BehaviorSubject::next(self, value);
    }

    fn error(&mut self, error: E) {
        BehaviorSubject::error(self, error);
    }

    fn complete(&mut self) {
        BehaviorSubject::complete(self);
    }
}
