//! Signed request construction and the single-call pipeline.
//!
//! # Design
//! `CbwClient` holds only read-only configuration plus its collaborators
//! (transport, diagnostics, clock) and carries no state between calls.
//! A call goes through three explicit steps:
//!
//! 1. `build_request` turns an `Endpoint` into a signed `HttpRequest`
//!    without touching the network.
//! 2. `execute` hands it to the `Transport` and classifies the cases where
//!    no response came back.
//! 3. `normalize` judges the status and parses the body.
//!
//! `send` chains the three. The pager and the resource methods are built
//! on top of `send` and live in their own modules.

use std::sync::Arc;

use url::Url;

use crate::config::ClientConfig;
use crate::diagnostics::{Diagnostics, Event, TracingDiagnostics};
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpRequest, HttpResponse};
use crate::normalize::{normalize, normalize_record};
use crate::record::Record;
use crate::signer::{Clock, RequestSigner, SystemClock};
use crate::transport::{Transport, TransportError, UreqTransport};
use crate::types::{Endpoint, ExpectedStatus, Outcome};

/// Blocking client for the CBW API.
pub struct CbwClient {
    config: ClientConfig,
    signer: RequestSigner,
    transport: Box<dyn Transport>,
    diagnostics: Arc<dyn Diagnostics>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CbwClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CbwClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl CbwClient {
    /// Client using `ureq`, `tracing` and the system clock.
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(&config);
        Self {
            signer: RequestSigner::new(config.api_key.clone(), config.secret_key.clone()),
            config,
            transport: Box::new(transport),
            diagnostics: Arc::new(TracingDiagnostics),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    /// Build the signed request for `endpoint`.
    ///
    /// Fails with `ApiError::Configuration` when the base URL has no
    /// usable `http`/`https` scheme or the credentials are empty.
    pub fn build_request(&self, endpoint: &Endpoint) -> ApiResult<HttpRequest> {
        let route = format!("{}{}", self.config.api_url, endpoint.path());
        let mut url = parse_url(&route).map_err(|reason| {
            self.diagnostics.record(Event::ConfigurationInvalid { route: &route, reason: &reason });
            ApiError::Configuration(reason)
        })?;
        if self.config.api_key.is_empty() || self.config.secret_key.is_empty() {
            let reason = "API key and secret key must not be empty".to_string();
            self.diagnostics.record(Event::ConfigurationInvalid { route: &route, reason: &reason });
            return Err(ApiError::Configuration(reason));
        }
        if !endpoint.query.is_empty() {
            url.query_pairs_mut().extend_pairs(endpoint.query.iter());
        }

        let path_and_query = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };
        let envelope = self.signer.sign(
            endpoint.method,
            &path_and_query,
            endpoint.body.as_deref(),
            self.clock.now(),
        );

        Ok(HttpRequest {
            method: endpoint.method,
            url: url.to_string(),
            headers: envelope.into_headers(),
            body: endpoint.body.clone(),
        })
    }

    /// Build, sign and send one request; any received response is returned.
    pub fn execute(&self, endpoint: &Endpoint) -> ApiResult<HttpResponse> {
        let request = self.build_request(endpoint)?;
        self.diagnostics.record(Event::Request { method: request.method, route: &request.url });

        self.transport.execute(&request).map_err(|e| match e {
            TransportError::Connectivity(reason) => {
                self.diagnostics
                    .record(Event::ConnectivityFailed { route: &request.url, reason: &reason });
                ApiError::Connectivity { route: request.url.clone(), reason }
            }
            TransportError::Configuration(reason) => {
                self.diagnostics
                    .record(Event::ConfigurationInvalid { route: &request.url, reason: &reason });
                ApiError::Configuration(reason)
            }
        })
    }

    /// Execute `endpoint` and normalize the response.
    pub fn send(&self, endpoint: &Endpoint, expected: ExpectedStatus) -> ApiResult<Outcome> {
        let response = self.execute(endpoint)?;
        normalize(&endpoint.path(), &response, expected, self.diagnostics())
    }

    /// Execute `endpoint` and require a JSON body.
    pub fn send_record(&self, endpoint: &Endpoint, expected: ExpectedStatus) -> ApiResult<Record> {
        let response = self.execute(endpoint)?;
        normalize_record(&endpoint.path(), &response, expected, self.diagnostics())
    }
}

fn parse_url(route: &str) -> Result<Url, String> {
    let url = Url::parse(route).map_err(|e| format!("{route}: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(format!("{route}: the API URL must start with http:// or https://"));
    }
    Ok(url)
}
