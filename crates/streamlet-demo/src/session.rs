//! Transport choice and blocking helpers for one command run.

use std::cell::RefCell;
use std::rc::Rc;

use clap::ValueEnum;
use streamlet_core::{Notification, Stream};
use streamlet_http::{EventLoop, HttpClient, HttpConfig, ReqwestTransport};

use crate::error::{DemoError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Each request completes before the call that sent it returns.
    #[default]
    Inline,
    /// Requests run on worker threads; answers are dispatched on this thread.
    EventLoop,
}

pub struct Session {
    client: HttpClient,
    event_loop: Option<EventLoop>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .field("event_loop", &self.event_loop.is_some())
            .finish()
    }
}

impl Session {
    pub fn connect(config: HttpConfig, kind: TransportKind) -> Result<Self> {
        tracing::debug!(base_url = %config.base_url, ?kind, "connecting");
        match kind {
            TransportKind::Inline => {
                let transport = ReqwestTransport::new(&config)?;
                Ok(Self::with_client(HttpClient::new(transport, config)))
            }
            TransportKind::EventLoop => {
                let event_loop = EventLoop::new(&config)?;
                Ok(Self {
                    client: HttpClient::new(event_loop.clone(), config),
                    event_loop: Some(event_loop),
                })
            }
        }
    }

    /// A session over an existing client whose transport answers inline.
    pub fn with_client(client: HttpClient) -> Self {
        Self {
            client,
            event_loop: None,
        }
    }

    #[must_use]
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Wait until no request is outstanding.
    pub fn settle(&self) {
        if let Some(event_loop) = &self.event_loop {
            let dispatched = event_loop.run_until_idle();
            tracing::debug!(dispatched, "event loop idle");
        }
    }

    /// Subscribe, wait, and return the first value or the error.
    pub fn first<T: 'static, E: 'static>(&self, stream: &Stream<T, E>, what: &str) -> Result<T>
    where
        DemoError: From<E>,
    {
        let outcome: Rc<RefCell<Option<std::result::Result<T, E>>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&outcome);
        let subscription = stream.subscribe_notifications(move |notification: Notification<T, E>| {
            let mut slot = slot.borrow_mut();
            if slot.is_some() {
                return;
            }
            match notification {
                Notification::Next(value) => *slot = Some(Ok(value)),
                Notification::Error(error) => *slot = Some(Err(error)),
                Notification::Complete => {}
            }
        });
        self.settle();
        subscription.unsubscribe();

        let result = outcome.borrow_mut().take();
        match result {
            Some(Ok(value)) => Ok(value),
            Some(Err(error)) => Err(error.into()),
            None => Err(DemoError::NoAnswer {
                what: what.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use streamlet_http::{HttpError, Method, MockTransport};

    fn session(mock: &MockTransport) -> Session {
        Session::with_client(HttpClient::new(mock.clone(), HttpConfig::default()))
    }

    #[test]
    fn first_returns_value_or_error() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "/ok", 200, "[1,2]")
            .respond(Method::Get, "/bad", 404, "");
        let session = session(&mock);

        let ok: Vec<u8> = session
            .first(&session.client().get_json("/ok"), "ok")
            .expect("value");
        assert_eq!(ok, vec![1, 2]);

        let bad = session.first(&session.client().get_json::<Vec<u8>>("/bad"), "bad");
        assert!(matches!(
            bad,
            Err(DemoError::Http(HttpError::Status { status: 404, .. }))
        ));
    }

    #[test]
    fn silent_stream_is_no_answer() {
        let session = session(&MockTransport::new());
        let result = session.first(&Stream::<u8, Infallible>::empty(), "nothing");
        assert!(matches!(result, Err(DemoError::NoAnswer { .. })));
    }
}
