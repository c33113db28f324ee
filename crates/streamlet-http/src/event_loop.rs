//! Background I/O with callbacks delivered on the owning thread.
//!
//! # Design
//!
//! Each request runs on its own named worker thread using the blocking
//! client. The worker sends the outcome back over an `mpsc` channel tagged
//! with the request id. The owning thread drains the channel in
//! [`EventLoop::turn`] or [`EventLoop::run_until_idle`] and invokes the
//! stored callback. Callbacks, and therefore every stream signal, only ever
//! run on the owning thread.
//!
//! # Cancellation
//!
//! Cancelling removes the stored callback. The worker still finishes its
//! request; its outcome is discarded when it arrives.
//!
//! # Failure Modes
//!
//! - **Worker lost**: a worker that dies without reporting leaves its
//!   callback waiting. [`EventLoop::run_until_idle`] waits at most the
//!   request timeout plus [`STALL_MARGIN`] for any outcome, then fails every
//!   stranded callback with [`TransportError::Other`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::HttpConfig;
use crate::error::{ConfigError, TransportError};
use crate::request::{HttpRequest, HttpResponse};
use crate::reqwest_transport::{build_client, execute};
use crate::transport::{PendingRequest, ResponseCallback, Transport};

/// Slack on top of the request timeout before waiting requests are treated
/// as lost.
pub const STALL_MARGIN: Duration = Duration::from_secs(1);

struct Completion {
    id: u64,
    result: Result<HttpResponse, TransportError>,
}

struct Inner {
    client: Client,
    sender: mpsc::Sender<Completion>,
    receiver: mpsc::Receiver<Completion>,
    waiting: RefCell<HashMap<u64, ResponseCallback>>,
    next_id: Cell<u64>,
    stall_after: Duration,
}

/// Transport that runs requests on worker threads and answers from
/// [`turn`](EventLoop::turn).
///
/// Cloning yields another handle to the same loop.
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("waiting", &self.waiting())
            .finish_non_exhaustive()
    }
}

impl EventLoop {
    pub fn new(config: &HttpConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (sender, receiver) = mpsc::channel();
        Ok(Self {
            inner: Rc::new(Inner {
                client: build_client(config)?,
                sender,
                receiver,
                waiting: RefCell::new(HashMap::new()),
                next_id: Cell::new(0),
                stall_after: config.timeout() + STALL_MARGIN,
            }),
        })
    }

    /// Requests whose callback has not run yet (cancelled ones excluded).
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.inner.waiting.borrow().len()
    }

    /// Wait up to `timeout` for the first outcome, then dispatch it and any
    /// others already available. Returns how many callbacks ran.
    pub fn turn(&self, timeout: Duration) -> usize {
        let mut dispatched = 0;
        match self.inner.receiver.recv_timeout(timeout) {
            Ok(completion) => dispatched += usize::from(self.dispatch(completion)),
            Err(_) => return 0,
        }
        while let Ok(completion) = self.inner.receiver.try_recv() {
            dispatched += usize::from(self.dispatch(completion));
        }
        dispatched
    }

    /// Block until no callback is waiting. Callbacks may start new
    /// requests; those are waited for too.
    ///
    /// If nothing arrives for longer than the request timeout plus
    /// [`STALL_MARGIN`], the remaining callbacks are failed.
    pub fn run_until_idle(&self) -> usize {
        let mut dispatched = 0;
        while self.waiting() > 0 {
            match self.inner.receiver.recv_timeout(self.inner.stall_after) {
                Ok(completion) => dispatched += usize::from(self.dispatch(completion)),
                Err(mpsc::RecvTimeoutError::Timeout) => dispatched += self.fail_stranded(),
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        dispatched
    }

    fn fail_stranded(&self) -> usize {
        let stranded = std::mem::take(&mut *self.inner.waiting.borrow_mut());
        let count = stranded.len();
        tracing::warn!(count, waited = ?self.inner.stall_after, "request workers never reported");
        for (id, callback) in stranded {
            callback(Err(TransportError::Other {
                message: format!("request {id} was lost: its worker never reported"),
            }));
        }
        count
    }

    fn dispatch(&self, completion: Completion) -> bool {
        let callback = self.inner.waiting.borrow_mut().remove(&completion.id);
        match callback {
            Some(callback) => {
                callback(completion.result);
                true
            }
            None => {
                tracing::trace!(id = completion.id, "discarding outcome of cancelled request");
                false
            }
        }
    }
}

impl Transport for EventLoop {
    fn send(&self, request: HttpRequest, on_response: ResponseCallback) -> PendingRequest {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let client = self.inner.client.clone();
        let sender = self.inner.sender.clone();
        let spawned = thread::Builder::new()
            .name(format!("streamlet-http-{id}"))
            .spawn(move || {
                let result = execute(&client, request);
                // The loop may be gone already; nobody is waiting then.
                let _ = sender.send(Completion { id, result });
            });
        if let Err(err) = spawned {
            tracing::warn!(id, error = %err, "could not start request worker");
            on_response(Err(TransportError::Spawn {
                message: err.to_string(),
            }));
            return PendingRequest::finished();
        }

        self.inner.waiting.borrow_mut().insert(id, on_response);
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        PendingRequest::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let removed = inner.waiting.borrow_mut().remove(&id);
            if removed.is_some() {
                tracing::debug!(id, "request cancelled");
            }
        })
    }
}
