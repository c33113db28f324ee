//! Fire-and-forget event channel between collaborators.

use std::convert::Infallible;

use streamlet_core::{Stream, Subject};

/// A private broadcast subject behind a send-only and a listen-only side.
///
/// Listeners get only values emitted after they subscribe. Nothing outside
/// can complete or fail the channel.
#[derive(Debug)]
pub struct Emitter<T> {
    subject: Subject<T>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self {
            subject: Subject::new(),
        }
    }
}

impl<T: Clone + 'static> Emitter<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, value: T) {
        self.subject.next(value);
    }

    pub fn listen(&self) -> Stream<T, Infallible> {
        self.subject.as_stream()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.subject.observer_count()
    }
}
