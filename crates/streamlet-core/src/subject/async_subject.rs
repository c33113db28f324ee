#![forbid(unsafe_code)]

//! Terminal-value-only subject.
//!
//! Pushes are remembered but not forwarded. On `complete` every subscriber,
//! past and future, receives the last pushed value (if there was one)
//! followed by completion. An error is forwarded as usual and discards the
//! remembered value.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use crate::notification::{Notification, Observer};
use crate::stream::Stream;
use crate::subscriber::Subscriber;
use crate::subscription::Subscription;

use super::StreamState;
use super::hub::{Hub, Terminal};

pub struct AsyncSubject<T, E = Infallible> {
    hub: Hub<T, E>,
    last: Rc<RefCell<Option<T>>>,
}

impl<T, E> Clone for AsyncSubject<T, E> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
            last: Rc::clone(&self.last),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Default for AsyncSubject<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for AsyncSubject<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSubject")
            .field("has_value", &self.last.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> AsyncSubject<T, E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hub: Hub::new(),
            last: Rc::new(RefCell::new(None)),
        }
    }

    /// Remember `value`. Nothing is delivered until completion.
    pub fn next(&self, value: T) {
        if !self.hub.is_active() {
            tracing::trace!("async subject: push after termination ignored");
            return;
        }
        *self.last.borrow_mut() = Some(value);
    }

    pub fn error(&self, error: E) {
        if self.hub.finish(Terminal::Errored(error.clone())) {
            self.last.borrow_mut().take();
            self.hub.publish([Notification::Error(error)]);
        }
    }

    /// Deliver the last value and completion to everyone.
    pub fn complete(&self) {
        if self.hub.finish(Terminal::Completed) {
            let last = self.last.borrow().clone();
            self.hub.publish(final_batch(last));
        }
    }

    /// Read-only view.
    #[must_use]
    pub fn as_stream(&self) -> Stream<T, E> {
        let hub = self.hub.clone();
        let last = Rc::clone(&self.last);
        Stream::new(move |subscriber: Subscriber<T, E>| match hub.terminal() {
            Some(Terminal::Completed) => {
                let value = last.borrow().clone();
                subscriber.emit_all(final_batch(value));
            }
            Some(Terminal::Errored(error)) => subscriber.error(error),
            None => hub.register(&subscriber),
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

fn final_batch<T, E>(last: Option<T>) -> impl Iterator<Item = Notification<T, E>> {
    last.map(Notification::Next)
        .into_iter()
        .chain(std::iter::once(Notification::Complete))
}

impl<T: Clone + 'static, E: Clone + 'static> Observer<T, E> for AsyncSubject<T, E> {
    fn next(&mut self, value: T) {
        AsyncSubject::next(self, value);
    }

    fn error(&mut self, error: E) {
        AsyncSubject::error(self, error);
    }

    fn complete(&mut self) {
        AsyncSubject::complete(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<Notification<&'static str, &'static str>>>>;

    fn record(subject: &AsyncSubject<&'static str, &'static str>) -> Log {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        subject
            .as_stream()
            .subscribe_notifications(move |n| sink.borrow_mut().push(n));
        log
    }

    #[test]
    fn only_last_value_after_completion() {
        let subject = AsyncSubject::new();
        let early = record(&subject);
        subject.next("v1");
        subject.next("v2");
        subject.next("v3");
        assert!(early.borrow().is_empty());
        subject.complete();

        let late = record(&subject);
        let expected = vec![Notification::Next("v3"), Notification::Complete];
        assert_eq!(*early.borrow(), expected);
        assert_eq!(*late.borrow(), expected);
    }

    #[test]
    fn nothing_without_completion() {
        let subject = AsyncSubject::new();
        let log = record(&subject);
        subject.next("v1");
        subject.next("v2");
        assert!(log.borrow().is_empty());
        assert_eq!(subject.state(), StreamState::Active);
    }

    #[test]
    fn completion_without_values() {
        let subject = AsyncSubject::new();
        let log = record(&subject);
        subject.complete();
        assert_eq!(*log.borrow(), vec![Notification::Complete]);
    }

    #[test]
    fn error_discards_last_value() {
        let subject = AsyncSubject::new();
        subject.next("v1");
        let early = record(&subject);
        subject.error("broken");
        subject.complete();
        let late = record(&subject);
        assert_eq!(*early.borrow(), vec![Notification::Error("broken")]);
        assert_eq!(*late.borrow(), vec![Notification::Error("broken")]);
    }
}
