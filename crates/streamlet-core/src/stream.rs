#![forbid(unsafe_code)]

//! Cold, lazily produced streams.
//!
//! # Design
//!
//! A [`Stream<T, E>`] is a shared producer function. Nothing runs until
//! [`subscribe`](Stream::subscribe) is called; each call runs the producer
//! again with a fresh [`Subscriber`]. Cloning a `Stream` shares the producer,
//! not any running work.
//!
//! Operators live in [`crate::operators`] as further `impl Stream` blocks,
//! so chains read left to right:
//!
//! ```
//! use streamlet_core::Stream;
//!
//! let doubled: Stream<i32> = Stream::from_values(vec![1, 2, 3])
//!     .filter(|v| v % 2 == 1)
//!     .map(|v| v * 2);
//! let _sub = doubled.subscribe_next(|v| println!("{v}"));
//! ```

use std::convert::Infallible;
use std::rc::Rc;

use crate::notification::{FnObserver, Notification, NotificationObserver, Observer};
use crate::subscriber::Subscriber;
use crate::subscription::Subscription;

type Producer<T, E> = dyn Fn(Subscriber<T, E>);

/// A cold stream of `T` values that may fail with `E`.
pub struct Stream<T, E = Infallible> {
    producer: Rc<Producer<T, E>>,
}

impl<T, E> Clone for Stream<T, E> {
    fn clone(&self) -> Self {
        Self {
            producer: Rc::clone(&self.producer),
        }
    }
}

impl<T, E> std::fmt::Debug for Stream<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Build a stream from a producer.
    ///
    /// The producer runs once per subscription. It emits through the given
    /// [`Subscriber`] and registers cleanup with
    /// [`Subscriber::add_teardown`] or [`Subscriber::add`].
    pub fn new(producer: impl Fn(Subscriber<T, E>) + 'static) -> Self {
        Self {
            producer: Rc::new(producer),
        }
    }

    /// A stream that completes without emitting.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(|subscriber: Subscriber<T, E>| subscriber.complete())
    }

    /// A stream that never emits and never terminates.
    #[must_use]
    pub fn never() -> Self {
        Self::new(|_subscriber: Subscriber<T, E>| {})
    }

    /// Subscribe with any [`Observer`].
    pub fn subscribe(&self, observer: impl Observer<T, E> + 'static) -> Subscription {
        let subscriber = Subscriber::new(observer);
        let subscription = subscriber.subscription();
        self.run(subscriber);
        subscription
    }

    /// Run the producer against an existing subscriber.
    pub(crate) fn run(&self, subscriber: Subscriber<T, E>) {
        (self.producer)(subscriber);
    }

    /// Subscribe `observer` as a child of `parent`.
    ///
    /// The child is cancelled when the parent closes, and unlinks itself
    /// from the parent when it finishes first. Linking happens before the
    /// producer runs, so a synchronous source stops as soon as the parent
    /// stops wanting values.
    pub(crate) fn subscribe_within<U: 'static, F: 'static>(
        &self,
        parent: &Subscriber<U, F>,
        observer: impl Observer<T, E> + 'static,
    ) -> Subscription {
        let subscriber = Subscriber::new(observer);
        let subscription = subscriber.subscription();
        parent.adopt(&subscriber);
        if !subscriber.is_closed() {
            self.run(subscriber);
        }
        subscription
    }

    /// Subscribe to values only. Errors and completion are ignored.
    pub fn subscribe_next(&self, on_next: impl FnMut(T) + 'static) -> Subscription {
        self.subscribe(FnObserver::new(on_next, |_: E| {}, || {}))
    }

    /// Subscribe with one closure per signal.
    pub fn subscribe_with(
        &self,
        on_next: impl FnMut(T) + 'static,
        on_error: impl FnMut(E) + 'static,
        on_complete: impl FnMut() + 'static,
    ) -> Subscription {
        self.subscribe(FnObserver::new(on_next, on_error, on_complete))
    }

    /// Subscribe with a single handler receiving [`Notification`]s.
    pub fn subscribe_notifications(
        &self,
        handler: impl FnMut(Notification<T, E>) + 'static,
    ) -> Subscription {
        self.subscribe(NotificationObserver::new(handler))
    }

    /// Apply a custom operator.
    pub fn pipe<R>(self, operator: impl FnOnce(Self) -> R) -> R {
        operator(self)
    }
}

impl<T: Clone + 'static, E: 'static> Stream<T, E> {
    /// A stream that emits one value, then completes.
    pub fn of(value: T) -> Self {
        Self::from_values(vec![value])
    }

    /// A stream that emits each value in order, then completes.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Self {
        let values: Rc<[T]> = values.into_iter().collect();
        Self::new(move |subscriber: Subscriber<T, E>| {
            for value in values.iter() {
                if subscriber.is_stopped() {
                    return;
                }
                subscriber.next(value.clone());
            }
            subscriber.complete();
        })
    }
}

impl<T: 'static, E: Clone + 'static> Stream<T, E> {
    /// A stream that fails immediately with `error`.
    pub fn throw(error: E) -> Self {
        Self::new(move |subscriber: Subscriber<T, E>| subscriber.error(error.clone()))
    }
}
