#![forbid(unsafe_code)]

//! Error recovery and lifecycle hooks.

use std::cell::Cell;
use std::rc::Rc;

use crate::stream::Stream;
use crate::subscriber::Subscriber;

use super::{Relay, pass};

impl<T: 'static, E: 'static> Stream<T, E> {
    /// On error, continue with the stream returned by `handler`.
    ///
    /// Values already emitted stay emitted. The replacement's own error (if
    /// any) reaches the subscriber.
    pub fn catch_error<F: 'static>(
        self,
        handler: impl Fn(E) -> Stream<T, F> + 'static,
    ) -> Stream<T, F> {
        let handler = Rc::new(handler);
        Stream::new(move |downstream: Subscriber<T, F>| {
            let handler = Rc::clone(&handler);
            self.subscribe_within(
                &downstream,
                Relay::with_error(&downstream, pass, move |d: &Subscriber<T, F>, error: E| {
                    let replacement = handler(error);
                    replacement.subscribe_within(d, d.clone());
                }),
            );
        })
    }

    /// Run `effect` once when the subscription ends, whether by completion,
    /// error or unsubscribe.
    pub fn finalize(self, effect: impl Fn() + 'static) -> Self {
        let effect = Rc::new(effect);
        Stream::new(move |downstream: Subscriber<T, E>| {
            let effect = Rc::clone(&effect);
            downstream.add_teardown(move || effect());
            self.subscribe_within(&downstream, downstream.clone());
        })
    }

    /// Resubscribe to the source after an error, up to `max_retries` times.
    ///
    /// Each attempt is a fresh subscription, so a cold source starts over
    /// (an HTTP stream sends a new request). There is no delay between
    /// attempts. Once the retries are used up, the last error is delivered.
    pub fn retry(self, max_retries: usize) -> Self {
        Stream::new(move |downstream: Subscriber<T, E>| {
            let failures = Rc::new(Cell::new(0_usize));
            attempt(&self, &downstream, failures, max_retries);
        })
    }
}

fn attempt<T: 'static, E: 'static>(
    source: &Stream<T, E>,
    downstream: &Subscriber<T, E>,
    failures: Rc<Cell<usize>>,
    max_retries: usize,
) {
    let again = source.clone();
    source.subscribe_within(
        downstream,
        Relay::with_error(downstream, pass, move |d: &Subscriber<T, E>, error: E| {
            let failed = failures.get();
            if failed >= max_retries {
                d.error(error);
                return;
            }
            failures.set(failed + 1);
            tracing::warn!(attempt = failed + 1, max_retries, "stream failed, resubscribing");
            attempt(&again, d, Rc::clone(&failures), max_retries);
        }),
    );
}

#[cfg(test)]
mod tests {
    use crate::Stream;
    use crate::notification::Notification;
    use crate::subscriber::Subscriber;
    use crate::testing::Recorder;
    use std::cell::Cell;
    use std::rc::Rc;

    fn flaky(failures_before_success: u32, calls: Rc<Cell<u32>>) -> Stream<&'static str, String> {
        Stream::new(move |subscriber: Subscriber<&'static str, String>| {
            let call = calls.get() + 1;
            calls.set(call);
            if call <= failures_before_success {
                subscriber.error(format!("attempt {call} failed"));
            } else {
                subscriber.next("ok");
                subscriber.complete();
            }
        })
    }

    #[test]
    fn catch_error_switches_to_fallback() {
        let recorder = Recorder::new();
        let source = Stream::new(|s: Subscriber<i32, &'static str>| {
            s.next(1);
            s.error("boom");
        });
        recorder.record(&source.catch_error(|_| Stream::<i32, ()>::from_values([9])));
        assert_eq!(
            recorder.notifications(),
            vec![
                Notification::Next(1),
                Notification::Next(9),
                Notification::Complete
            ]
        );
    }

    #[test]
    fn retry_succeeds_within_budget() {
        let calls = Rc::new(Cell::new(0));
        let recorder = Recorder::new();
        recorder.record(&flaky(2, Rc::clone(&calls)).retry(3));
        assert_eq!(recorder.values(), vec!["ok"]);
        assert!(recorder.is_completed());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn retry_gives_up_with_last_error() {
        let calls = Rc::new(Cell::new(0));
        let recorder = Recorder::new();
        recorder.record(&flaky(10, Rc::clone(&calls)).retry(2));
        assert_eq!(
            recorder.notifications(),
            vec![Notification::Error("attempt 3 failed".to_string())]
        );
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn finalize_runs_once_for_each_ending() {
        let runs = Rc::new(Cell::new(0));

        let counter = Rc::clone(&runs);
        Stream::<u8, ()>::from_values([1])
            .finalize(move || counter.set(counter.get() + 1))
            .subscribe_next(|_| {});
        assert_eq!(runs.get(), 1);

        let counter = Rc::clone(&runs);
        Stream::<u8, ()>::throw(())
            .finalize(move || counter.set(counter.get() + 1))
            .subscribe_next(|_| {});
        assert_eq!(runs.get(), 2);

        let counter = Rc::clone(&runs);
        let sub = Stream::<u8, ()>::never()
            .finalize(move || counter.set(counter.get() + 1))
            .subscribe_next(|_| {});
        assert_eq!(runs.get(), 2);
        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(runs.get(), 3);
    }
}
