//! HTTP requests as cold, single-value streams.
//!
//! Each subscription sends one request through the [`Transport`] and ends
//! with exactly one of:
//!
//! - `Next(value)` then `Complete`, for a 2xx response whose body decodes;
//! - `Error(HttpError::Status)`, for any other status;
//! - `Error(HttpError::Decode)`, for a 2xx response whose body does not
//!   decode;
//! - `Error(HttpError::Transport)`, when no response arrived.
//!
//! Nothing is sent until subscribe. Unsubscribing cancels the pending
//! request, so the observer hears nothing afterwards.

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use streamlet_core::{Stream, Subscriber};

use crate::config::HttpConfig;
use crate::error::{HttpError, TransportError};
use crate::request::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Send `request` per subscription and emit the successful response.
pub fn fetch(
    transport: Rc<dyn Transport>,
    request: HttpRequest,
) -> Stream<HttpResponse, HttpError> {
    request_stream(transport, request, Ok)
}

/// Send `request` per subscription and emit the JSON-decoded body.
pub fn fetch_json<T: DeserializeOwned + 'static>(
    transport: Rc<dyn Transport>,
    request: HttpRequest,
) -> Stream<T, HttpError> {
    request_stream(transport, request, |response: HttpResponse| response.json::<T>())
}

fn classify(response: HttpResponse) -> Result<HttpResponse, HttpError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(HttpError::Status {
            status: response.status,
            body: response.text().into_owned(),
        })
    }
}

fn request_stream<T: 'static>(
    transport: Rc<dyn Transport>,
    request: HttpRequest,
    decode: impl Fn(HttpResponse) -> Result<T, HttpError> + 'static,
) -> Stream<T, HttpError> {
    let decode = Rc::new(decode);
    Stream::new(move |subscriber: Subscriber<T, HttpError>| {
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, %url, "sending request");

        let decode = Rc::clone(&decode);
        let target = subscriber.clone();
        let on_response = move |result: Result<HttpResponse, TransportError>| {
            let outcome = result
                .map_err(HttpError::from)
                .and_then(classify)
                .and_then(|response| (*decode)(response));
            match outcome {
                Ok(value) => {
                    target.next(value);
                    target.complete();
                }
                Err(error) => {
                    tracing::warn!(%method, %url, %error, "request failed");
                    target.error(error);
                }
            }
        };

        let pending = transport.send(request.clone(), Box::new(on_response));
        if !pending.is_finished() {
            subscriber.add_teardown(move || pending.cancel());
        }
    })
}

/// Builds requests against a base URL and sends them through a shared
/// transport.
///
/// Every request carries `accept: application/json`.
#[derive(Clone)]
pub struct HttpClient {
    transport: Rc<dyn Transport>,
    config: HttpConfig,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(transport: impl Transport + 'static, config: HttpConfig) -> Self {
        Self {
            transport: Rc::new(transport),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    #[must_use]
    pub fn transport(&self) -> Rc<dyn Transport> {
        Rc::clone(&self.transport)
    }

    fn request(&self, request: HttpRequest) -> HttpRequest {
        request.with_header("accept", "application/json")
    }

    /// `GET path`, emitting the raw response.
    pub fn get(&self, path: &str) -> Stream<HttpResponse, HttpError> {
        let request = self.request(HttpRequest::get(self.config.url(path)));
        fetch(self.transport(), request)
    }

    /// `GET path`, emitting the decoded JSON body.
    pub fn get_json<T: DeserializeOwned + 'static>(&self, path: &str) -> Stream<T, HttpError> {
        let request = self.request(HttpRequest::get(self.config.url(path)));
        fetch_json(self.transport(), request)
    }

    /// `GET path?query`, with the pairs form-encoded in order.
    ///
    /// A URL that cannot be built yields a stream failing with
    /// [`HttpError::Encode`].
    pub fn get_json_with_query<T: DeserializeOwned + 'static>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Stream<T, HttpError> {
        match reqwest::Url::parse_with_params(&self.config.url(path), query) {
            Ok(url) => {
                let request = self.request(HttpRequest::get(url.as_str()));
                fetch_json(self.transport(), request)
            }
            Err(err) => Stream::throw(HttpError::encode(err.to_string())),
        }
    }

    /// `PUT path` with `body` as JSON. Emits the response once its status
    /// is 2xx; the body is not decoded.
    pub fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Stream<HttpResponse, HttpError> {
        match HttpRequest::put(self.config.url(path)).with_json_body(body) {
            Ok(request) => fetch(self.transport(), self.request(request)),
            Err(error) => Stream::throw(error),
        }
    }
}
