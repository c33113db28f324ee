//! The seam between HTTP streams and whatever performs the I/O.

use std::rc::Rc;

use crate::error::TransportError;
use crate::request::{HttpRequest, HttpResponse};

/// Receives the outcome of one request. Called at most once, on the thread
/// that owns the transport.
pub type ResponseCallback = Box<dyn FnOnce(Result<HttpResponse, TransportError>)>;

/// Performs requests on behalf of HTTP streams.
///
/// A transport may answer inline (before `send` returns) or later from its
/// own event loop. Either way the callback runs on the owning thread.
pub trait Transport {
    fn send(&self, request: HttpRequest, on_response: ResponseCallback) -> PendingRequest;
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn send(&self, request: HttpRequest, on_response: ResponseCallback) -> PendingRequest {
        (**self).send(request, on_response)
    }
}

/// Cancel hook for an in-flight request.
///
/// Cancelling guarantees the callback is not invoked. The I/O itself may
/// still run to completion in the background. Dropping the handle does not
/// cancel.
#[must_use = "keep the handle to be able to cancel the request"]
pub struct PendingRequest {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl PendingRequest {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle for a request that already completed.
    pub fn finished() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cancel.is_none()
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("finished", &self.is_finished())
            .finish()
    }
}
