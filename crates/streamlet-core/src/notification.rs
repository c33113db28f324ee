#![forbid(unsafe_code)]

//! Signals a stream delivers and the observer side that receives them.

/// One signal from a stream: a value or one of the two terminal signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<T, E> {
    /// A produced value.
    Next(T),
    /// The stream failed. Nothing follows.
    Error(E),
    /// The stream finished. Nothing follows.
    Complete,
}

impl<T, E> Notification<T, E> {
    /// Whether this signal ends the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Next(_))
    }

    /// The carried value, if this is a `Next`.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Next(value) => Some(value),
            _ => None,
        }
    }
}

/// Receiver of stream signals.
///
/// Implementations never see a call after `error` or `complete`; the
/// [`Subscriber`](crate::Subscriber) wrapping them enforces that.
pub trait Observer<T, E> {
    fn next(&mut self, value: T);
    fn error(&mut self, error: E);
    fn complete(&mut self);
}

/// Observer built from three closures.
pub struct FnObserver<N, Er, C> {
    on_next: N,
    on_error: Er,
    on_complete: C,
}

impl<N, Er, C> FnObserver<N, Er, C> {
    pub fn new(on_next: N, on_error: Er, on_complete: C) -> Self {
        Self {
            on_next,
            on_error,
            on_complete,
        }
    }
}

impl<T, E, N, Er, C> Observer<T, E> for FnObserver<N, Er, C>
where
    N: FnMut(T),
    Er: FnMut(E),
    C: FnMut(),
{
    fn next(&mut self, value: T) {
        (self.on_next)(value);
    }

    fn error(&mut self, error: E) {
        (self.on_error)(error);
    }

    fn complete(&mut self) {
        (self.on_complete)();
    }
}

/// Observer that receives every signal as a [`Notification`].
pub struct NotificationObserver<F> {
    handler: F,
}

impl<F> NotificationObserver<F> {
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<T, E, F> Observer<T, E> for NotificationObserver<F>
where
    F: FnMut(Notification<T, E>),
{
    fn next(&mut self, value: T) {
        (self.handler)(Notification::Next(value));
    }

    fn error(&mut self, error: E) {
        (self.handler)(Notification::Error(error));
    }

    fn complete(&mut self) {
        (self.handler)(Notification::Complete);
    }
}
