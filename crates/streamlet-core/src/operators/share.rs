#![forbid(unsafe_code)]

//! Multicasting a cold source.

use std::cell::RefCell;
use std::rc::Rc;

use crate::stream::Stream;
use crate::subject::{ReplaySubject, StreamState};
use crate::subscriber::Subscriber;

impl<T: Clone + 'static, E: Clone + 'static> Stream<T, E> {
    /// Share one subscription to the source between all subscribers and
    /// replay everything it emitted to late arrivals.
    ///
    /// The first subscriber connects the source to an internal
    /// [`ReplaySubject`]. The connection stays up when subscribers leave, so
    /// a completed result is served from memory from then on. If the source
    /// errored, the next subscriber starts a fresh connection; this is what
    /// makes `share_replay().retry(n)` resend a failed request.
    pub fn share_replay(self) -> Self {
        let shared: Rc<RefCell<Option<ReplaySubject<T, E>>>> = Rc::new(RefCell::new(None));
        Stream::new(move |downstream: Subscriber<T, E>| {
            let (subject, connect) = {
                let mut slot = shared.borrow_mut();
                let live = slot
                    .as_ref()
                    .filter(|subject| subject.state() != StreamState::Errored)
                    .cloned();
                match live {
                    Some(subject) => (subject, false),
                    None => {
                        let fresh = ReplaySubject::new();
                        *slot = Some(fresh.clone());
                        (fresh, true)
                    }
                }
            };
            subject
                .as_stream()
                .subscribe_within(&downstream, downstream.clone());
            if connect {
                tracing::debug!("share_replay: connecting source");
                self.subscribe(subject);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Stream;
    use crate::notification::Notification;
    use crate::subject::Subject;
    use crate::subscriber::Subscriber;
    use crate::testing::Recorder;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counted(runs: Rc<Cell<u32>>) -> Stream<u32, &'static str> {
        Stream::new(move |subscriber: Subscriber<u32, &'static str>| {
            runs.set(runs.get() + 1);
            subscriber.next(runs.get());
            subscriber.complete();
        })
    }

    #[test]
    fn source_runs_once_for_many_subscribers() {
        let runs = Rc::new(Cell::new(0));
        let shared = counted(Rc::clone(&runs)).share_replay();
        let beginners = Recorder::new();
        let advanced = Recorder::new();
        beginners.record(&shared.clone().map(|v| v * 10));
        advanced.record(&shared.map(|v| v + 1));
        assert_eq!(runs.get(), 1);
        assert_eq!(beginners.values(), vec![10]);
        assert_eq!(advanced.values(), vec![2]);
        assert!(advanced.is_completed());
    }

    #[test]
    fn late_subscriber_gets_replay_of_live_source() {
        let source: Subject<i32, &str> = Subject::new();
        let shared = source.as_stream().share_replay();
        let first = Recorder::new();
        first.record(&shared);
        source.next(1);
        let second = Recorder::new();
        second.record(&shared);
        source.next(2);
        assert_eq!(first.values(), vec![1, 2]);
        assert_eq!(second.values(), vec![1, 2]);
        assert_eq!(source.observer_count(), 1);
    }

    #[test]
    fn error_triggers_reconnect_for_next_subscriber() {
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let failing_once = Stream::new(move |subscriber: Subscriber<&'static str, &'static str>| {
            counter.set(counter.get() + 1);
            if counter.get() == 1 {
                subscriber.error("first call fails");
            } else {
                subscriber.next("data");
                subscriber.complete();
            }
        })
        .share_replay();

        let failed = Recorder::new();
        failed.record(&failing_once);
        assert_eq!(
            failed.notifications(),
            vec![Notification::Error("first call fails")]
        );

        let recovered = Recorder::new();
        recovered.record(&failing_once.clone().retry(1));
        assert_eq!(recovered.values(), vec!["data"]);
        assert_eq!(runs.get(), 2);
    }
}
