#![forbid(unsafe_code)]

//! Value-by-value operators.

use std::rc::Rc;

use crate::stream::Stream;
use crate::subscriber::Subscriber;

use super::Relay;

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Transform each value.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Stream<U, E> {
        let f = Rc::new(f);
        Stream::new(move |downstream: Subscriber<U, E>| {
            let f = Rc::clone(&f);
            self.subscribe_within(
                &downstream,
                Relay::new(&downstream, move |d: &Subscriber<U, E>, value: T| d.next(f(value))),
            );
        })
    }

    /// Keep only values matching `predicate`.
    pub fn filter(self, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        let predicate = Rc::new(predicate);
        Stream::new(move |downstream: Subscriber<T, E>| {
            let predicate = Rc::clone(&predicate);
            self.subscribe_within(
                &downstream,
                Relay::new(&downstream, move |d: &Subscriber<T, E>, value: T| {
                    if predicate(&value) {
                        d.next(value);
                    }
                }),
            );
        })
    }

    /// Run a side effect for each value, passing it on unchanged.
    pub fn tap(self, effect: impl Fn(&T) + 'static) -> Self {
        let effect = Rc::new(effect);
        Stream::new(move |downstream: Subscriber<T, E>| {
            let effect = Rc::clone(&effect);
            self.subscribe_within(
                &downstream,
                Relay::new(&downstream, move |d: &Subscriber<T, E>, value: T| {
                    effect(&value);
                    d.next(value);
                }),
            );
        })
    }

    /// Transform the error.
    pub fn map_err<F: 'static>(self, f: impl Fn(E) -> F + 'static) -> Stream<T, F> {
        let f = Rc::new(f);
        Stream::new(move |downstream: Subscriber<T, F>| {
            let f = Rc::clone(&f);
            self.subscribe_within(
                &downstream,
                Relay::with_error(
                    &downstream,
                    super::pass,
                    move |d: &Subscriber<T, F>, error: E| d.error(f(error)),
                ),
            );
        })
    }

    /// Complete after `count` values. Zero completes at once without
    /// subscribing to the source.
    pub fn take(self, count: usize) -> Self {
        Stream::new(move |downstream: Subscriber<T, E>| {
            if count == 0 {
                downstream.complete();
                return;
            }
            let mut remaining = count;
            self.subscribe_within(
                &downstream,
                Relay::new(&downstream, move |d: &Subscriber<T, E>, value: T| {
                    remaining = remaining.saturating_sub(1);
                    d.next(value);
                    if remaining == 0 {
                        d.complete();
                    }
                }),
            );
        })
    }
}

impl<T: Clone + 'static, E: 'static> Stream<T, E> {
    /// Emit `value` first, then the source.
    pub fn start_with(self, value: T) -> Self {
        Stream::new(move |downstream: Subscriber<T, E>| {
            downstream.next(value.clone());
            if downstream.is_stopped() {
                return;
            }
            self.subscribe_within(&downstream, downstream.clone());
        })
    }
}

impl<T: Clone + PartialEq + 'static, E: 'static> Stream<T, E> {
    /// Drop values equal to the one emitted just before.
    pub fn distinct_until_changed(self) -> Self {
        Stream::new(move |downstream: Subscriber<T, E>| {
            let mut last: Option<T> = None;
            self.subscribe_within(
                &downstream,
                Relay::new(&downstream, move |d: &Subscriber<T, E>, value: T| {
                    if last.as_ref() == Some(&value) {
                        return;
                    }
                    last = Some(value.clone());
                    d.next(value);
                }),
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Stream;
    use crate::notification::Notification;
    use crate::subject::Subject;
    use crate::testing::Recorder;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn map_and_filter_chain() {
        let recorder = Recorder::new();
        recorder.record(
            &Stream::<i32, ()>::from_values(1..=6)
                .filter(|v| v % 2 == 0)
                .map(|v| format!("#{v}")),
        );
        assert_eq!(recorder.values(), vec!["#2", "#4", "#6"]);
        assert!(recorder.is_completed());
    }

    #[test]
    fn tap_sees_every_value() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let recorder = Recorder::new();
        recorder.record(
            &Stream::<i32, ()>::from_values([3, 4]).tap(move |v| sink.borrow_mut().push(*v)),
        );
        assert_eq!(*seen.borrow(), vec![3, 4]);
        assert_eq!(recorder.values(), vec![3, 4]);
    }

    #[test]
    fn map_err_converts_error() {
        let recorder = Recorder::new();
        recorder.record(&Stream::<u8, &str>::throw("io").map_err(|e| e.len()));
        assert_eq!(recorder.notifications(), vec![Notification::Error(2)]);
    }

    #[test]
    fn take_stops_synchronous_source() {
        let produced = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&produced);
        let recorder = Recorder::new();
        recorder.record(
            &Stream::<u32, ()>::from_values(0..10_000)
                .tap(move |_| *counter.borrow_mut() += 1)
                .take(3),
        );
        assert_eq!(recorder.values(), vec![0, 1, 2]);
        assert!(recorder.is_completed());
        assert_eq!(*produced.borrow(), 3);
    }

    #[test]
    fn take_zero_completes_immediately() {
        let recorder = Recorder::new();
        recorder.record(&Stream::<u8, ()>::never().take(0));
        assert_eq!(recorder.notifications(), vec![Notification::Complete]);
    }

    #[test]
    fn start_with_then_distinct() {
        let terms: Subject<&str> = Subject::new();
        let recorder = Recorder::new();
        let sub = recorder.record(&terms.as_stream().start_with("").distinct_until_changed());
        terms.next("");
        terms.next("ru");
        terms.next("ru");
        terms.next("rust");
        assert_eq!(recorder.values(), vec!["", "ru", "rust"]);

        sub.unsubscribe();
        assert_eq!(terms.observer_count(), 0);
    }
}
