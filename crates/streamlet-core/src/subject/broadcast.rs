#![forbid(unsafe_code)]

//! Broadcast-only subject: no memory of earlier pushes.

use std::convert::Infallible;

use crate::notification::{Notification, Observer};
use crate::stream::Stream;
use crate::subscriber::Subscriber;
use crate::subscription::Subscription;

use super::StreamState;
use super::hub::{Hub, Terminal};

/// Multicast subject that only forwards values pushed after subscribing.
///
/// Cloning a `Subject` creates a new handle to the **same** registry.
pub struct Subject<T, E = Infallible> {
    hub: Hub<T, E>,
}

impl<T, E> Clone for Subject<T, E> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Default for Subject<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for Subject<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Subject<T, E> {
    #[must_use]
    pub fn new() -> Self {
        Self { hub: Hub::new() }
    }

    /// Push a value to every current subscriber.
    pub fn next(&self, value: T) {
        if !self.hub.is_active() {
            tracing::trace!("subject: push after termination ignored");
            return;
        }
        self.hub.publish([Notification::Next(value)]);
    }

    /// Fail every current and future subscriber.
    pub fn error(&self, error: E) {
        if self.hub.finish(Terminal::Errored(error.clone())) {
            self.hub.publish([Notification::Error(error)]);
        }
    }

    /// Complete every current and future subscriber.
    pub fn complete(&self) {
        if self.hub.finish(Terminal::Completed) {
            self.hub.publish([Notification::Complete]);
        }
    }

    /// Read-only view: subscribe capability only.
    #[must_use]
    pub fn as_stream(&self) -> Stream<T, E> {
        let hub = self.hub.clone();
        Stream::new(move |subscriber: Subscriber<T, E>| match hub.terminal() {
            Some(Terminal::Completed) => subscriber.complete(),
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

    /// Number of live subscribers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.hub.observer_count()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Observer<T, E> for Subject<T, E> {
    fn next(&mut self, value: T) {
        Subject::next(self, value);
    }

    fn error(&mut self, error: E) {
        Subject::error(self, error);
    }

    fn complete(&mut self) {
        Subject::complete(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log<T> = Rc<RefCell<Vec<Notification<T, &'static str>>>>;

    fn record<T: Clone + 'static>(subject: &Subject<T, &'static str>) -> (Log<T>, Subscription) {
        let log: Log<T> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = subject
            .as_stream()
            .subscribe_notifications(move |n| sink.borrow_mut().push(n));
        (log, sub)
    }

    #[test]
    fn early_subscriber_sees_pushes() {
        let subject = Subject::new();
        let (early, _sub) = record(&subject);
        subject.next(1);
        subject.next(2);
        subject.next(3);
        assert_eq!(
            *early.borrow(),
            vec![
                Notification::Next(1),
                Notification::Next(2),
                Notification::Next(3)
            ]
        );
    }

    #[test]
    fn late_subscriber_sees_nothing_retroactively() {
        let subject = Subject::new();
        subject.next(1);
        subject.next(2);
        let (late, _sub) = record(&subject);
        assert!(late.borrow().is_empty());
        subject.next(3);
        assert_eq!(*late.borrow(), vec![Notification::Next(3)]);
    }

    #[test]
    fn terminal_state_is_sticky() {
        let subject: Subject<i32, &str> = Subject::new();
        let (log, sub) = record(&subject);
        subject.complete();
        subject.next(9);
        subject.error("late");
        assert_eq!(subject.state(), StreamState::Completed);
        assert_eq!(*log.borrow(), vec![Notification::Complete]);
        assert!(sub.is_closed());
        // Cancelling after termination is a no-op.
        sub.unsubscribe();

        let (after, _) = record(&subject);
        assert_eq!(*after.borrow(), vec![Notification::Complete]);
    }

    #[test]
    fn errored_subject_replays_error_to_late_subscribers() {
        let subject: Subject<i32, &str> = Subject::new();
        subject.error("down");
        let (log, _) = record(&subject);
        assert_eq!(*log.borrow(), vec![Notification::Error("down")]);
        assert_eq!(subject.state(), StreamState::Errored);
    }

    #[test]
    fn unsubscribe_removes_from_registry() {
        let subject: Subject<i32, &str> = Subject::new();
        let (log, sub) = record(&subject);
        assert_eq!(subject.observer_count(), 1);
        sub.unsubscribe();
        assert_eq!(subject.observer_count(), 0);
        subject.next(1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn self_unsubscribe_mid_broadcast_keeps_others_intact() {
        let subject: Subject<i32, &str> = Subject::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let first_sub: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let handle = Rc::clone(&first_sub);
        let sink = Rc::clone(&order);
        let sub = subject.as_stream().subscribe_next(move |v| {
            sink.borrow_mut().push(("a", v));
            let current = handle.borrow().clone();
            if let Some(current) = current {
                current.unsubscribe();
            }
        });
        *first_sub.borrow_mut() = Some(sub);

        let sink = Rc::clone(&order);
        let _b = subject
            .as_stream()
            .subscribe_next(move |v| sink.borrow_mut().push(("b", v)));
        let sink = Rc::clone(&order);
        let _c = subject
            .as_stream()
            .subscribe_next(move |v| sink.borrow_mut().push(("c", v)));

        subject.next(1);
        subject.next(2);
        assert_eq!(
            *order.borrow(),
            vec![("a", 1), ("b", 1), ("c", 1), ("b", 2), ("c", 2)]
        );
        assert_eq!(subject.observer_count(), 2);
    }

    #[test]
    fn observer_unsubscribing_a_later_one_mid_broadcast() {
        let subject: Subject<i32, &str> = Subject::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let handle = Rc::clone(&victim);
        let sink = Rc::clone(&order);
        let _a = subject.as_stream().subscribe_next(move |v| {
            sink.borrow_mut().push(("a", v));
            let target = handle.borrow().clone();
            if let Some(target) = target {
                target.unsubscribe();
            }
        });
        let sink = Rc::clone(&order);
        let b = subject
            .as_stream()
            .subscribe_next(move |v| sink.borrow_mut().push(("b", v)));
        *victim.borrow_mut() = Some(b);

        subject.next(1);
        assert_eq!(*order.borrow(), vec![("a", 1)]);
    }

    #[test]
    fn stream_can_be_piped_into_subject() {
        let subject: Subject<i32, &str> = Subject::new();
        let (log, _) = record(&subject);
        Stream::from_values(vec![4, 5]).subscribe(subject.clone());
        assert_eq!(
            *log.borrow(),
            vec![
                Notification::Next(4),
                Notification::Next(5),
                Notification::Complete
            ]
        );
    }

    #[test]
    fn every_subscriber_sees_reentrant_pushes_in_push_order() {
        let subject: Subject<i32, &str> = Subject::new();
        let feedback = subject.clone();
        let (first, _a) = record(&subject);
        let _echo = subject.as_stream().subscribe_next(move |v| {
            if v < 3 {
                feedback.next(v + 1);
            }
        });
        let (last, _c) = record(&subject);

        subject.next(1);
        let expected: Vec<_> = (1..=3).map(Notification::Next).collect();
        assert_eq!(*first.borrow(), expected);
        assert_eq!(*last.borrow(), expected);
    }

    #[test]
    fn completion_from_a_subscriber_waits_for_the_current_value() {
        let subject: Subject<i32, &str> = Subject::new();
        let closer = subject.clone();
        let _a = subject.as_stream().subscribe_next(move |_| closer.complete());
        let (b, _b) = record(&subject);

        subject.next(1);
        assert_eq!(*b.borrow(), vec![Notification::Next(1), Notification::Complete]);
        assert_eq!(subject.state(), StreamState::Completed);
    }
}
