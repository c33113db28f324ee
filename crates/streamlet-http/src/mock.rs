//! Scripted transport for tests.
//!
//! Requests are matched on method and URL path (query ignored). A matching
//! scripted reply is delivered inline. Replies for a route are consumed in
//! order and the last one keeps answering once the others are used up.
//! Requests without a route are held until the test resolves them, which is
//! how cancellation and in-flight behavior are exercised.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::TransportError;
use crate::request::{HttpRequest, HttpResponse, Method};
use crate::transport::{PendingRequest, ResponseCallback, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Respond(HttpResponse),
    Fail(TransportError),
}

impl Reply {
    fn into_result(self) -> Result<HttpResponse, TransportError> {
        match self {
            Self::Respond(response) => Ok(response),
            Self::Fail(error) => Err(error),
        }
    }
}

struct Route {
    method: Method,
    path: String,
    replies: VecDeque<Reply>,
}

struct Held {
    id: u64,
    request: HttpRequest,
    callback: ResponseCallback,
}

#[derive(Default)]
struct MockState {
    routes: Vec<Route>,
    held: Vec<Held>,
    sent: Vec<HttpRequest>,
    cancelled: usize,
    next_id: u64,
}

impl MockState {
    fn reply_for(&mut self, request: &HttpRequest) -> Option<Reply> {
        let path = path_of(&request.url);
        let route = self
            .routes
            .iter_mut()
            .find(|route| route.method == request.method && route.path == path)?;
        if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        }
    }
}

fn path_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| url.split('?').next().unwrap_or(url).to_string())
}

/// In-memory [`Transport`]. Cloning shares the script and the log.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MockTransport")
            .field("routes", &state.routes.len())
            .field("held", &state.held.len())
            .field("sent", &state.sent.len())
            .finish()
    }
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for `method path`.
    pub fn respond(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: impl Into<Vec<u8>>,
    ) -> &Self {
        self.script(method, path, Reply::Respond(HttpResponse::new(status, body)))
    }

    /// Script a transport failure for `method path`.
    pub fn fail(&self, method: Method, path: &str, error: TransportError) -> &Self {
        self.script(method, path, Reply::Fail(error))
    }

    fn script(&self, method: Method, path: &str, reply: Reply) -> &Self {
        let mut state = self.state.borrow_mut();
        let existing = state
            .routes
            .iter()
            .position(|route| route.method == method && route.path == path);
        match existing {
            Some(index) => state.routes[index].replies.push_back(reply),
            None => state.routes.push(Route {
                method,
                path: path.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    /// Every request sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.borrow().sent.clone()
    }

    /// Requests waiting for [`resolve_next`](Self::resolve_next).
    #[must_use]
    pub fn held(&self) -> Vec<HttpRequest> {
        self.state
            .borrow()
            .held
            .iter()
            .map(|held| held.request.clone())
            .collect()
    }

    /// Held requests that were cancelled before being resolved.
    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.state.borrow().cancelled
    }

    /// Answer the oldest held request. Returns `false` if none is held.
    pub fn resolve_next(&self, status: u16, body: impl Into<Vec<u8>>) -> bool {
        self.complete_next(Ok(HttpResponse::new(status, body)))
    }

    /// Fail the oldest held request. Returns `false` if none is held.
    pub fn fail_next(&self, error: TransportError) -> bool {
        self.complete_next(Err(error))
    }

    fn complete_next(&self, result: Result<HttpResponse, TransportError>) -> bool {
        let next = {
            let mut state = self.state.borrow_mut();
            if state.held.is_empty() {
                None
            } else {
                Some(state.held.remove(0))
            }
        };
        match next {
            Some(held) => {
                (held.callback)(result);
                true
            }
            None => false,
        }
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest, on_response: ResponseCallback) -> PendingRequest {
        let reply = {
            let mut state = self.state.borrow_mut();
            state.sent.push(request.clone());
            state.reply_for(&request)
        };
        if let Some(reply) = reply {
            on_response(reply.into_result());
            return PendingRequest::finished();
        }

        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.held.push(Held {
                id,
                request,
                callback: on_response,
            });
            id
        };
        let state = Rc::downgrade(&self.state);
        PendingRequest::new(move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let removed = {
                let mut state = state.borrow_mut();
                let position = state.held.iter().position(|held| held.id == id);
                position.map(|index| state.held.remove(index))
            };
            if removed.is_some() {
                state.borrow_mut().cancelled += 1;
            }
        })
    }
}
