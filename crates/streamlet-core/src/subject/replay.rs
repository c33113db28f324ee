#![forbid(unsafe_code)]

//! Full-history subject.
//!
//! Every value pushed while active is recorded. A new subscriber receives
//! the recorded values in order as one batch, then the live pushes. After
//! termination the history is still replayed, followed by the terminal
//! signal.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use crate::notification::{Notification, Observer};
use crate::stream::Stream;
use crate::subscriber::Subscriber;
use crate::subscription::Subscription;

use super::StreamState;
use super::hub::{Hub, Terminal};

/// Multicast subject that replays its history to every subscriber.
///
/// Unbounded by default. [`with_capacity`](ReplaySubject::with_capacity)
/// keeps only the most recent values.
pub struct ReplaySubject<T, E = Infallible> {
    hub: Hub<T, E>,
    history: Rc<RefCell<VecDeque<T>>>,
    capacity: Option<usize>,
}

impl<T, E> Clone for ReplaySubject<T, E> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
            history: Rc::clone(&self.history),
            capacity: self.capacity,
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Default for ReplaySubject<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for ReplaySubject<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaySubject")
            .field("recorded", &self.history.borrow().len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> ReplaySubject<T, E> {
    /// Unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hub: Hub::new(),
            history: Rc::new(RefCell::new(VecDeque::new())),
            capacity: None,
        }
    }

    /// Keep at most `capacity` of the most recent values. A capacity of
    /// zero records nothing, which behaves like a broadcast-only subject.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    /// Record `value` and push it to every subscriber.
    pub fn next(&self, value: T) {
        if !self.hub.is_active() {
            tracing::trace!("replay subject: push after termination ignored");
            return;
        }
        {
            let mut history = self.history.borrow_mut();
            history.push_back(value.clone());
            if let Some(capacity) = self.capacity {
                while history.len() > capacity {
                    history.pop_front();
                }
            }
        }
        self.hub.publish([Notification::Next(value)]);
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

    /// Read-only view: recorded history, then live pushes.
    #[must_use]
    pub fn as_stream(&self) -> Stream<T, E> {
        let hub = self.hub.clone();
        let history = Rc::clone(&self.history);
        Stream::new(move |subscriber: Subscriber<T, E>| {
            let recorded: Vec<T> = history.borrow().iter().cloned().collect();
            let terminal = hub.terminal();
            if terminal.is_none() {
                hub.register(&subscriber);
            }
            let tail = terminal.map(Terminal::into_notification);
            subscriber.emit_all(recorded.into_iter().map(Notification::Next).chain(tail));
        })
    }

    pub fn subscribe(&self, observer: impl Observer<T, E> + 'static) -> Subscription {
        self.as_stream().subscribe(observer)
    }

    /// Values currently held for replay, oldest first.
    #[must_use]
    pub fn recorded(&self) -> Vec<T> {
        self.history.borrow().iter().cloned().collect()
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

impl<T: Clone + 'static, E: Clone + 'static> Observer<T, E> for ReplaySubject<T, E> {
    fn next(&mut self, value: T) {
        ReplaySubject::next(self, value);
    }

    fn error(&mut self, error: E) {
        ReplaySubject::error(self, error);
    }

    fn complete(&mut self) {
        ReplaySubject::complete(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<Notification<i32, &'static str>>>>;

    fn record(subject: &ReplaySubject<i32, &'static str>) -> Log {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        subject
            .as_stream()
            .subscribe_notifications(move |n| sink.borrow_mut().push(n));
        log
    }

    #[test]
    fn late_subscriber_after_completion_sees_everything() {
        let subject = ReplaySubject::new();
        let early = record(&subject);
        subject.next(1);
        subject.next(2);
        subject.next(3);
        subject.complete();

        let late = record(&subject);
        let expected = vec![
            Notification::Next(1),
            Notification::Next(2),
            Notification::Next(3),
            Notification::Complete,
        ];
        assert_eq!(*early.borrow(), expected);
        assert_eq!(*late.borrow(), expected);
    }

    #[test]
    fn mid_stream_subscriber_gets_history_then_live() {
        let subject = ReplaySubject::new();
        subject.next(1);
        let log = record(&subject);
        subject.next(2);
        assert_eq!(
            *log.borrow(),
            vec![Notification::Next(1), Notification::Next(2)]
        );
    }

    #[test]
    fn errored_history_ends_with_error() {
        let subject = ReplaySubject::new();
        subject.next(7);
        subject.error("gone");
        subject.next(8);
        let log = record(&subject);
        assert_eq!(
            *log.borrow(),
            vec![Notification::Next(7), Notification::Error("gone")]
        );
        assert_eq!(subject.state(), StreamState::Errored);
    }

    #[test]
    fn bounded_history_keeps_most_recent() {
        let subject = ReplaySubject::with_capacity(2);
        for v in 1..=5 {
            subject.next(v);
        }
        assert_eq!(subject.recorded(), vec![4, 5]);
        let log = record(&subject);
        assert_eq!(
            *log.borrow(),
            vec![Notification::Next(4), Notification::Next(5)]
        );
    }

    #[test]
    fn push_during_replay_lands_after_history() {
        let subject: ReplaySubject<i32, &str> = ReplaySubject::new();
        subject.next(1);
        subject.next(2);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let feedback = subject.clone();
        subject.as_stream().subscribe_next(move |v| {
            sink.borrow_mut().push(v);
            if v == 1 {
                feedback.next(10);
            }
        });
        assert_eq!(*seen.borrow(), vec![1, 2, 10]);
        assert_eq!(subject.recorded(), vec![1, 2, 10]);
    }
}
