#![forbid(unsafe_code)]

//! The producer-facing side of one subscription.
//!
//! # Design
//!
//! A [`Subscriber<T, E>`] wraps the observer handed to
//! [`Stream::subscribe`](crate::Stream::subscribe) in shared,
//! reference-counted storage (`Rc<..>`). Producers and operators clone it
//! freely; every clone feeds the same observer.
//!
//! # Invariants
//!
//! 1. Signals reach the observer in the order they were emitted.
//! 2. Nothing is delivered after `error` or `complete`.
//! 3. Nothing is delivered after the subscription is closed.
//! 4. Teardowns run exactly once, when the subscriber closes (terminal
//!    signal or `unsubscribe`). A teardown added after closing runs at once.
//! 5. A child linked with [`Subscriber::adopt`] drops its teardown from the
//!    parent when it closes first, so a long-lived parent only holds links
//!    to children that are still running.
//!
//! # Re-entrancy
//!
//! The observer is taken out of its slot while it runs, so no borrow is
//! held across user code. An emission that arrives while the observer is
//! running (for example, the observer pushes into a subject it is
//! subscribed to) is queued and delivered right after the running callback
//! returns.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::notification::{Notification, Observer};
use crate::subscription::{Closeable, Subscription};

type Teardown = Box<dyn FnOnce()>;

struct Shared<T, E> {
    observer: RefCell<Option<Box<dyn Observer<T, E>>>>,
    queue: RefCell<VecDeque<Notification<T, E>>>,
    teardowns: RefCell<Vec<(u64, Teardown)>>,
    next_key: Cell<u64>,
    /// A terminal signal has been accepted; further emissions are dropped.
    stopped: Cell<bool>,
    /// Teardowns have run; the observer is gone.
    closed: Cell<bool>,
    draining: Cell<bool>,
}

impl<T, E> Shared<T, E> {
    fn drain(&self) {
        if self.draining.replace(true) {
            return;
        }
        loop {
            if self.closed.get() {
                self.queue.borrow_mut().clear();
                break;
            }
            let popped = self.queue.borrow_mut().pop_front();
            let Some(notification) = popped else {
                break;
            };
            let taken = self.observer.borrow_mut().take();
            let Some(mut observer) = taken else {
                self.queue.borrow_mut().clear();
                break;
            };

            let terminal = notification.is_terminal();
            match notification {
                Notification::Next(value) => observer.next(value),
                Notification::Error(error) => observer.error(error),
                Notification::Complete => observer.complete(),
            }

            if terminal {
                drop(observer);
                self.draining.set(false);
                self.shutdown();
                return;
            }
            if self.closed.get() {
                drop(observer);
            } else {
                *self.observer.borrow_mut() = Some(observer);
            }
        }
        self.draining.set(false);
    }

    /// Store `teardown`, or run it now if already closed.
    fn push_teardown(&self, teardown: Teardown) -> Option<u64> {
        if self.closed.get() {
            teardown();
            return None;
        }
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.teardowns.borrow_mut().push((key, teardown));
        Some(key)
    }

    fn remove_teardown(&self, key: u64) {
        // Busy only while shutdown takes the list; nothing to remove then.
        let removed = match self.teardowns.try_borrow_mut() {
            Ok(mut teardowns) => teardowns
                .iter()
                .position(|(entry, _)| *entry == key)
                .map(|index| teardowns.remove(index)),
            Err(_) => None,
        };
        drop(removed);
    }

    fn shutdown(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.stopped.set(true);
        let pending = std::mem::take(&mut *self.queue.borrow_mut());
        drop(pending);
        // The slot is empty while the observer runs; it is dropped by
        // `drain` in that case.
        let observer = self
            .observer
            .try_borrow_mut()
            .ok()
            .and_then(|mut slot| slot.take());
        drop(observer);

        let teardowns = std::mem::take(&mut *self.teardowns.borrow_mut());
        for (_, teardown) in teardowns {
            teardown();
        }
    }
}

impl<T, E> Closeable for Shared<T, E> {
    fn close(&self) {
        self.shutdown();
    }

    fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

/// Producer-facing handle to one subscription.
///
/// Cloning a `Subscriber` creates a new handle to the **same** observer.
pub struct Subscriber<T, E> {
    shared: Rc<Shared<T, E>>,
}

impl<T, E> Clone for Subscriber<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T, E> std::fmt::Debug for Subscriber<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("stopped", &self.shared.stopped.get())
            .field("closed", &self.shared.closed.get())
            .field("queued", &self.shared.queue.borrow().len())
            .finish()
    }
}

impl<T: 'static, E: 'static> Subscriber<T, E> {
    /// Wrap an observer.
    pub fn new(observer: impl Observer<T, E> + 'static) -> Self {
        Self {
            shared: Rc::new(Shared {
                observer: RefCell::new(Some(Box::new(observer))),
                queue: RefCell::new(VecDeque::new()),
                teardowns: RefCell::new(Vec::new()),
                next_key: Cell::new(0),
                stopped: Cell::new(false),
                closed: Cell::new(false),
                draining: Cell::new(false),
            }),
        }
    }

    /// Deliver a value.
    pub fn next(&self, value: T) {
        self.emit_all([Notification::Next(value)]);
    }

    /// Deliver an error and close.
    pub fn error(&self, error: E) {
        self.emit_all([Notification::Error(error)]);
    }

    /// Deliver completion and close.
    pub fn complete(&self) {
        self.emit_all([Notification::Complete]);
    }

    /// Deliver a batch of signals back to back.
    ///
    /// The whole batch is queued before any of it is delivered, so signals
    /// emitted re-entrantly by the observer land after the batch. Anything
    /// after the first terminal signal is discarded.
    pub fn emit_all(&self, notifications: impl IntoIterator<Item = Notification<T, E>>) {
        let shared = &*self.shared;
        {
            let mut queue = shared.queue.borrow_mut();
            for notification in notifications {
                if shared.stopped.get() {
                    break;
                }
                if notification.is_terminal() {
                    shared.stopped.set(true);
                }
                queue.push_back(notification);
            }
        }
        shared.drain();
    }

    /// Register cleanup to run when this subscriber closes.
    pub fn add_teardown(&self, teardown: impl FnOnce() + 'static) {
        self.shared.push_teardown(Box::new(teardown));
    }

    /// Tie another subscription's lifetime to this one.
    pub fn add(&self, subscription: Subscription) {
        if subscription.is_closed() {
            return;
        }
        self.add_teardown(move || subscription.unsubscribe());
    }

    /// Cancel `child` when this subscriber closes. If the child closes
    /// first, the link is dropped.
    pub(crate) fn adopt<A: 'static, B: 'static>(&self, child: &Subscriber<A, B>) {
        let subscription = child.subscription();
        let linked = self
            .shared
            .push_teardown(Box::new(move || subscription.unsubscribe()));
        let Some(key) = linked else {
            return;
        };
        let parent = Rc::downgrade(&self.shared);
        child.add_teardown(move || {
            if let Some(parent) = parent.upgrade() {
                parent.remove_teardown(key);
            }
        });
    }

    #[cfg(test)]
    pub(crate) fn teardown_count(&self) -> usize {
        self.shared.teardowns.borrow().len()
    }

    /// Cancel from the producer side: no further delivery, teardowns run.
    pub fn unsubscribe(&self) {
        self.shared.shutdown();
    }

    /// Whether teardowns have run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.get()
    }

    /// Whether a terminal signal was accepted or the subscriber closed.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.get()
    }

    /// The caller-side handle for this subscriber.
    #[must_use]
    pub fn subscription(&self) -> Subscription {
        let target: Rc<dyn Closeable> = self.shared.clone();
        Subscription::from_target(target)
    }
}

impl<T: 'static, E: 'static> Observer<T, E> for Subscriber<T, E> {
    fn next(&mut self, value: T) {
        self.emit_all([Notification::Next(value)]);
    }

    fn error(&mut self, error: E) {
        self.emit_all([Notification::Error(error)]);
    }

    fn complete(&mut self) {
        self.emit_all([Notification::Complete]);
    }
}
