#![forbid(unsafe_code)]

//! Core: cold streams, subscriptions, multicast subjects, and operators.
//!
//! - [`Stream`]: a lazy producer; each subscription runs it afresh.
//! - [`Subscription`] / [`SubscriptionGuard`]: cancellation handles.
//! - [`subject`]: broadcast-only, latest-value, full-replay and
//!   terminal-value-only multicast sources, each with a read-only
//!   `as_stream()` view.
//! - [`operators`]: `map`, `filter`, `switch_map`, `share_replay` and the
//!   rest, as chainable methods on [`Stream`].
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). Delivery is
//! synchronous inside the call that triggers it.

pub mod notification;
pub mod operators;
pub mod stream;
pub mod subject;
pub mod subscriber;
pub mod subscription;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use notification::{FnObserver, Notification, NotificationObserver, Observer};
pub use operators::LogLevel;
pub use stream::Stream;
pub use subject::{AsyncSubject, BehaviorSubject, ReplaySubject, StreamState, Subject};
pub use subscriber::Subscriber;
pub use subscription::{Subscription, SubscriptionGuard};
