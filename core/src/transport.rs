//! Blocking HTTP execution.
//!
//! # Design
//! `Transport` is the only place the client touches the network. It
//! returns every response it receives as data, whatever the status, and
//! classifies the cases where no response was received at all. Tests
//! swap in a scripted transport; production code uses `UreqTransport`.

use ureq::http;
use ureq::Agent;

use crate::config::ClientConfig;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Why no response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// DNS, connect, proxy, TLS or timeout failure. The request may or may
    /// not have been processed by the server.
    Connectivity(String),
    /// The request itself is unusable, e.g. a URL the HTTP stack rejects.
    Configuration(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Connectivity(reason) | TransportError::Configuration(reason) => {
                f.write_str(reason)
            }
        }
    }
}

/// Executes one request and returns the raw response.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `ureq`-backed transport.
///
/// Status codes are never turned into errors here; 4xx and 5xx come back
/// as `HttpResponse` values for the normalizer to judge.
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(!config.verify_tls)
            .build();
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .tls_config(tls)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = http::Request::builder()
            .method(to_http_method(request.method))
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let sent = match &request.body {
            Some(body) => builder.body(body.clone().into_bytes()).map(|r| self.agent.run(r)),
            None => builder.body(()).map(|r| self.agent.run(r)),
        };
        let mut response = sent
            .map_err(|e| TransportError::Configuration(e.to_string()))?
            .map_err(classify)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::Connectivity(format!("reading response body: {e}")))?;

        Ok(HttpResponse { status, headers, body })
    }
}

fn to_http_method(method: HttpMethod) -> http::Method {
    match method {
        HttpMethod::Get => http::Method::GET,
        HttpMethod::Post => http::Method::POST,
        HttpMethod::Put => http::Method::PUT,
        HttpMethod::Patch => http::Method::PATCH,
        HttpMethod::Delete => http::Method::DELETE,
    }
}

fn classify(error: ureq::Error) -> TransportError {
    match error {
        ureq::Error::BadUri(_) | ureq::Error::Http(_) | ureq::Error::RequireHttpsOnly(_) => {
            TransportError::Configuration(error.to_string())
        }
        other => TransportError::Connectivity(other.to_string()),
    }
}
