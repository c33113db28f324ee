#![forbid(unsafe_code)]

//! HTTP requests as cold, cancellable streams.
//!
//! [`HttpClient`] (or the free functions [`fetch`] and [`fetch_json`])
//! turns a request into a [`Stream`](streamlet_core::Stream) that sends on
//! subscribe and emits one value or one error. The I/O goes through a
//! [`Transport`]:
//!
//! - [`ReqwestTransport`] answers inline on the calling thread;
//! - [`EventLoop`] runs requests on worker threads and delivers results
//!   from [`EventLoop::turn`];
//! - `MockTransport` (feature `test-helpers`) scripts or holds responses.
//!
//! ```no_run
//! use streamlet_http::{HttpClient, HttpConfig, ReqwestTransport};
//!
//! # fn main() -> Result<(), streamlet_http::ConfigError> {
//! let config = HttpConfig::from_env()?;
//! let client = HttpClient::new(ReqwestTransport::new(&config)?, config);
//! let _sub = client
//!     .get_json::<serde_json::Value>("/api/courses")
//!     .subscribe_next(|body| println!("{body}"));
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod event_loop;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
pub mod request;
pub mod reqwest_transport;
pub mod transport;

pub use adapter::{HttpClient, fetch, fetch_json};
pub use config::HttpConfig;
pub use error::{ConfigError, HttpError, Result, TransportError};
pub use event_loop::{EventLoop, STALL_MARGIN};
#[cfg(any(test, feature = "test-helpers"))]
pub use mock::MockTransport;
pub use request::{HttpRequest, HttpResponse, Method};
pub use reqwest_transport::ReqwestTransport;
pub use transport::{PendingRequest, ResponseCallback, Transport};
