//! Inline transport on the reqwest blocking client.

use reqwest::blocking::Client;

use crate::config::HttpConfig;
use crate::error::{ConfigError, TransportError};
use crate::request::{HttpRequest, HttpResponse, Method};
use crate::transport::{PendingRequest, ResponseCallback, Transport};

/// Performs each request on the calling thread and answers before `send`
/// returns. Suited to command-line tools; an interactive program that must
/// stay responsive uses [`EventLoop`](crate::EventLoop) instead.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            client: build_client(config)?,
        })
    }

    /// Perform `request` and wait for the whole response.
    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        execute(&self.client, request)
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest, on_response: ResponseCallback) -> PendingRequest {
        on_response(self.execute(request));
        PendingRequest::finished()
    }
}

pub(crate) fn build_client(config: &HttpConfig) -> Result<Client, ConfigError> {
    Ok(Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .build()?)
}

pub(crate) fn execute(
    client: &Client,
    request: HttpRequest,
) -> Result<HttpResponse, TransportError> {
    let method = match request.method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    };
    tracing::debug!(method = %request.method, url = %request.url, "http request");

    let mut builder = client.request(method, &request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.body {
        builder = builder.body(body);
    }

    let response = builder.send()?;
    let status = response.status().as_u16();
    let body = response.bytes()?.to_vec();
    tracing::debug!(url = %request.url, status, bytes = body.len(), "http response");
    Ok(HttpResponse::new(status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        let config = HttpConfig::default().with_timeout_ms(0);
        assert!(matches!(
            ReqwestTransport::new(&config),
            Err(ConfigError::ZeroTimeout)
        ));
    }

    #[test]
    fn unreachable_host_reports_transport_error() {
        // Port 9 (discard) on loopback is closed on test machines.
        let config = HttpConfig::default()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout_ms(2_000);
        let transport = ReqwestTransport::new(&config).expect("client builds");
        let result = transport.execute(HttpRequest::get(config.url("/api/courses")));
        assert!(result.is_err());
    }
}
