//! Error types for the CBW API client.
//!
//! # Design
//! Every pipeline path resolves to either an `Outcome` or one of these
//! variants; nothing panics and nothing terminates the process. The
//! variants follow the failure classes of the pipeline:
//!
//! - `Connectivity`: no response was received. The server-side effect is
//!   unknown, so this must not be read as "nothing there".
//! - `Configuration`: the client cannot build a request at all (bad base
//!   URL, empty credentials). Retrying will not help.
//! - `Status`: a response arrived with a status outside the expected set.
//! - `Decode`: an expected status arrived but the body was not valid JSON.

use thiserror::Error;

/// Errors returned by `CbwClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// DNS, connect, proxy, TLS handshake or timeout failure.
    #[error("request to {route} failed: {reason}")]
    Connectivity { route: String, reason: String },

    /// The client configuration cannot produce a valid request.
    #[error("invalid client configuration: {0}")]
    Configuration(String),

    /// The server answered with a status outside the expected set.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body of an otherwise successful response was not valid JSON.
    #[error("could not decode response: {reason}")]
    Decode { reason: String, body: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The server advertised a `next` page the pager could not follow.
    #[error("pagination failed: {0}")]
    Pagination(String),

    /// A mutating call was made without the identifier it targets.
    #[error("no {0} supplied")]
    MissingIdentifier(&'static str),
}

impl ApiError {
    /// True when the request may or may not have reached the server.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Connectivity { .. })
    }

    /// True when no later call with the same client can succeed.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ApiError::Configuration(_))
    }

    /// HTTP status of the offending response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body kept for diagnostics.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } | ApiError::Decode { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
