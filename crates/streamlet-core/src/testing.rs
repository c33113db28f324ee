#![forbid(unsafe_code)]

//! Test helpers: a notification recorder.

use std::cell::RefCell;
use std::rc::Rc;

use crate::notification::{Notification, NotificationObserver, Observer};
use crate::stream::Stream;
use crate::subscription::Subscription;

/// Records every signal a stream delivers.
///
/// Cloning shares the log, so a clone can be handed to the stream while the
/// test keeps the original for assertions.
pub struct Recorder<T, E> {
    log: Rc<RefCell<Vec<Notification<T, E>>>>,
}

impl<T, E> Clone for Recorder<T, E> {
    fn clone(&self) -> Self {
        Self {
            log: Rc::clone(&self.log),
        }
    }
}

impl<T, E> Default for Recorder<T, E> {
    fn default() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<T: 'static, E: 'static> Recorder<T, E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An observer appending to this recorder.
    pub fn observer(&self) -> impl Observer<T, E> + use<T, E> {
        let log = Rc::clone(&self.log);
        NotificationObserver::new(move |n: Notification<T, E>| log.borrow_mut().push(n))
    }

    /// Subscribe to `stream`, recording into this recorder.
    pub fn record(&self, stream: &Stream<T, E>) -> Subscription {
        stream.subscribe(self.observer())
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.log.borrow().last(), Some(Notification::Complete))
    }

    pub fn is_errored(&self) -> bool {
        matches!(self.log.borrow().last(), Some(Notification::Error(_)))
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Recorder<T, E> {
    pub fn notifications(&self) -> Vec<Notification<T, E>> {
        self.log.borrow().clone()
    }

    /// Values only, in delivery order.
    pub fn values(&self) -> Vec<T> {
        self.log
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Next(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// The error, if the stream failed.
    pub fn error(&self) -> Option<E> {
        self.log.borrow().iter().find_map(|n| match n {
            Notification::Error(error) => Some(error.clone()),
            _ => None,
        })
    }
}

impl<T, E> std::fmt::Debug for Recorder<T, E>
where
    T: std::fmt::Debug,
    E: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("log", &self.log.borrow())
            .finish()
    }
}
