#![forbid(unsafe_code)]

//! Combining several streams into one.

use crate::stream::Stream;

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Subscribe to each stream in turn, starting the next when the previous
    /// completes.
    pub fn concat(streams: impl IntoIterator<Item = Stream<T, E>>) -> Self {
        Stream::<Stream<T, E>, E>::from_values(streams).concat_map(|stream| stream)
    }

    /// Subscribe to all streams at once and forward values as they arrive.
    /// Completes when every stream has completed.
    pub fn merge(streams: impl IntoIterator<Item = Stream<T, E>>) -> Self {
        Stream::<Stream<T, E>, E>::from_values(streams).merge_map(|stream| stream)
    }
}

#[cfg(test)]
mod tests {
    use crate::Stream;
    use crate::subject::Subject;
    use crate::testing::Recorder;

    #[test]
    fn concat_waits_for_each_stream() {
        let first: Subject<u8> = Subject::new();
        let recorder = Recorder::new();
        recorder.record(&Stream::concat([
            first.as_stream(),
            Stream::from_values([3, 4]),
        ]));
        first.next(1);
        assert_eq!(recorder.values(), vec![1]);
        first.next(2);
        first.complete();
        assert_eq!(recorder.values(), vec![1, 2, 3, 4]);
        assert!(recorder.is_completed());
    }

    #[test]
    fn merge_forwards_in_arrival_order() {
        let left: Subject<&str> = Subject::new();
        let right: Subject<&str> = Subject::new();
        let recorder = Recorder::new();
        recorder.record(&Stream::merge([left.as_stream(), right.as_stream()]));
        right.next("r1");
        left.next("l1");
        right.complete();
        assert!(!recorder.is_completed());
        left.complete();
        assert_eq!(recorder.values(), vec!["r1", "l1"]);
        assert!(recorder.is_completed());
    }

    #[test]
    fn empty_input_completes() {
        let recorder: Recorder<u8, ()> = Recorder::new();
        recorder.record(&Stream::merge(Vec::new()));
        assert!(recorder.is_completed());
    }
}
