//! Blocking client for the CBW security and compliance API.
//!
//! # Overview
//! One method per API operation (servers, agents, hosts, groups, CVE
//! announcements, compliance rules, remote accesses, ...). Every call runs
//! the same pipeline: build a signed request, execute it, normalize the
//! response into a read-only `Record` or a classified `ApiError`.
//! Collection endpoints follow `Link: rel="next"` headers to the end.
//!
//! # Design
//! - `CbwClient` holds only read-only configuration; no state survives a
//!   call.
//! - Request building (`build_request`) never touches the network, and
//!   the `Transport`, `Diagnostics` and `Clock` collaborators are injected,
//!   so each stage is testable on its own.
//! - Responses are not bound to fixed DTOs: the API's payloads vary per
//!   resource, so `Record` mirrors the JSON structurally.
//! - Nothing in the library panics or exits the process. A connectivity
//!   failure (`ApiError::Connectivity`) is kept distinct from an empty
//!   success (`Outcome::Empty`).
//!
//! ```no_run
//! use cbw_core::{CbwClient, ClientConfig, Params};
//!
//! let client = CbwClient::new(ClientConfig::new("https://cbw.example.com", "key", "secret"));
//! for server in client.servers(&Params::new())? {
//!     println!("{:?}", server["hostname"].as_str());
//! }
//! # Ok::<(), cbw_core::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod normalize;
pub mod pager;
pub mod record;
pub mod resources;
pub mod routes;
pub mod signer;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::CbwClient;
pub use config::ClientConfig;
pub use diagnostics::{Diagnostics, Event, RecordingDiagnostics, TracingDiagnostics};
pub use error::{ApiError, ApiResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use record::{Record, RecordView};
pub use signer::{Clock, FixedClock, RequestSigner, SystemClock};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{Endpoint, ExpectedStatus, Outcome, Params};
