#![forbid(unsafe_code)]

//! Multicast subjects.
//!
//! A subject is both a push handle (`next`, `error`, `complete`) and a
//! source that many subscribers share. The variants differ only in what a
//! subscriber receives for values pushed before it arrived:
//!
//! - [`Subject`]: nothing. Broadcast only.
//! - [`BehaviorSubject`]: the current value, starting from an explicit
//!   initial one.
//! - [`ReplaySubject`]: the whole history (optionally bounded), even after
//!   completion.
//! - [`AsyncSubject`]: nothing until completion, then only the last value.
//!
//! Every variant hands out a read-only view through `as_stream()`. The view
//! can subscribe but cannot push, so shared state is only mutated by the
//! owner of the subject handle.
//!
//! # Architecture
//!
//! Subjects use `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Broadcasts iterate over a snapshot of the registry, so observers may
//! subscribe or unsubscribe (themselves or others) in the middle of a
//! broadcast without skipping or duplicating anyone else. A push made from
//! inside an observer is queued until the signal being broadcast has
//! reached every subscriber.
//!
//! # Invariants
//!
//! 1. Observers receive pushes in subscription order, and every observer
//!    sees the pushes in the order they were made.
//! 2. `complete` and `error` are terminal; later pushes and terminal
//!    signals are ignored.
//! 3. A subscriber that arrives after termination receives the variant's
//!    replay followed by the terminal signal.

mod async_subject;
mod behavior;
mod broadcast;
mod hub;
mod replay;

pub use async_subject::AsyncSubject;
pub use behavior::BehaviorSubject;
pub use broadcast::Subject;
pub use replay::ReplaySubject;

/// Lifecycle state shared by all subject variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    Active,
    Completed,
    Errored,
}

impl StreamState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}
