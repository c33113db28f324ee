#![forbid(unsafe_code)]

//! Observer registry and lifecycle shared by every subject variant.
//!
//! Signals are published through a queue. A push made while a broadcast is
//! running (an observer pushing into the subject it listens to) waits until
//! the current signal has reached every subscriber, so all subscribers see
//! the same order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::notification::Notification;
use crate::subscriber::Subscriber;

use super::StreamState;

/// How a subject ended.
#[derive(Debug, Clone)]
pub(crate) enum Terminal<E> {
    Completed,
    Errored(E),
}

impl<E> Terminal<E> {
    pub(crate) fn into_notification<T>(self) -> Notification<T, E> {
        match self {
            Terminal::Completed => Notification::Complete,
            Terminal::Errored(error) => Notification::Error(error),
        }
    }
}

struct Entry<T, E> {
    id: u64,
    /// Sequence number of the last signal published before this entry
    /// registered; only later signals are delivered to it.
    since: u64,
    subscriber: Subscriber<T, E>,
}

struct HubState<T, E> {
    observers: Vec<Entry<T, E>>,
    next_id: u64,
    published: u64,
    pending: VecDeque<(u64, Notification<T, E>)>,
    broadcasting: bool,
    terminal: Option<Terminal<E>>,
}

/// Registry of live subscribers plus the Active/Completed/Errored state.
pub(crate) struct Hub<T, E> {
    state: Rc<RefCell<HubState<T, E>>>,
}

impl<T, E> Clone for Hub<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Hub<T, E> {
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(HubState {
                observers: Vec::new(),
                next_id: 0,
                published: 0,
                pending: VecDeque::new(),
                broadcasting: false,
                terminal: None,
            })),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state.borrow().terminal.is_none()
    }

    pub(crate) fn terminal(&self) -> Option<Terminal<E>> {
        self.state.borrow().terminal.clone()
    }

    pub(crate) fn state(&self) -> StreamState {
        match self.state.borrow().terminal {
            None => StreamState::Active,
            Some(Terminal::Completed) => StreamState::Completed,
            Some(Terminal::Errored(_)) => StreamState::Errored,
        }
    }

    /// Add a subscriber; it is removed again when it closes. Signals
    /// published before this call, even if still queued, are not delivered
    /// to it.
    pub(crate) fn register(&self, subscriber: &Subscriber<T, E>) {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            let since = state.published;
            state.observers.push(Entry {
                id,
                since,
                subscriber: subscriber.clone(),
            });
            id
        };
        let weak = Rc::downgrade(&self.state);
        subscriber.add_teardown(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            // Busy only if a close happens inside a registry borrow; the
            // stale entry is then pruned by the next broadcast.
            if let Ok(mut state) = state.try_borrow_mut() {
                state.observers.retain(|entry| entry.id != id);
            }
        });
    }

    /// Enter a terminal state. Returns `false` if the hub had already
    /// terminated. The terminal signal itself is delivered by [`publish`].
    ///
    /// [`publish`]: Hub::publish
    pub(crate) fn finish(&self, terminal: Terminal<E>) -> bool {
        let mut state = self.state.borrow_mut();
        if state.terminal.is_some() {
            return false;
        }
        state.terminal = Some(terminal);
        true
    }

    /// Queue `signals` for every registered subscriber and deliver them,
    /// unless a broadcast is already running; that one delivers them once
    /// it reaches them.
    pub(crate) fn publish(&self, signals: impl IntoIterator<Item = Notification<T, E>>) {
        {
            let mut state = self.state.borrow_mut();
            for signal in signals {
                state.published += 1;
                let sequence = state.published;
                state.pending.push_back((sequence, signal));
            }
            if state.broadcasting {
                return;
            }
            state.broadcasting = true;
        }
        loop {
            let popped = {
                let mut state = self.state.borrow_mut();
                let popped = state.pending.pop_front();
                if popped.is_none() {
                    state.broadcasting = false;
                }
                popped
            };
            let Some((sequence, signal)) = popped else {
                break;
            };
            match signal {
                Notification::Next(value) => {
                    for subscriber in self.receivers(sequence) {
                        subscriber.next(value.clone());
                    }
                }
                Notification::Error(error) => {
                    for subscriber in self.release() {
                        subscriber.error(error.clone());
                    }
                }
                Notification::Complete => {
                    for subscriber in self.release() {
                        subscriber.complete();
                    }
                }
            }
        }
    }

    /// Live subscribers that registered before signal `sequence`, in
    /// subscription order. Closed entries are pruned.
    fn receivers(&self, sequence: u64) -> Vec<Subscriber<T, E>> {
        let mut state = self.state.borrow_mut();
        state.observers.retain(|entry| !entry.subscriber.is_closed());
        state
            .observers
            .iter()
            .filter(|entry| entry.since < sequence)
            .map(|entry| entry.subscriber.clone())
            .collect()
    }

    /// Empty the registry, returning the live subscribers.
    fn release(&self) -> Vec<Subscriber<T, E>> {
        let observers = std::mem::take(&mut self.state.borrow_mut().observers);
        observers
            .into_iter()
            .map(|entry| entry.subscriber)
            .filter(|subscriber| !subscriber.is_closed())
            .collect()
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.state
            .borrow()
            .observers
            .iter()
            .filter(|entry| !entry.subscriber.is_closed())
            .count()
    }
}
