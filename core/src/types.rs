//! Call descriptors and results shared by the client, normalizer and pager.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::http::HttpMethod;
use crate::record::Record;

/// Query parameters, kept sorted so URLs and signatures are deterministic.
pub type Params = BTreeMap<String, String>;

/// One logical API call: verb, route, optional query and JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub segments: Vec<String>,
    pub query: Params,
    pub body: Option<String>,
}

impl Endpoint {
    /// Start from a route constant such as `/api/v3/servers`.
    pub fn new(method: HttpMethod, route: &str) -> Self {
        Self {
            method,
            segments: vec![route.to_string()],
            query: Params::new(),
            body: None,
        }
    }

    /// Append a path segment. Identifiers are stringified as-is and must
    /// already be URL-safe.
    #[must_use]
    pub fn segment(mut self, segment: impl std::fmt::Display) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    #[must_use]
    pub fn query(mut self, params: &Params) -> Self {
        self.query.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        let text = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.body = Some(text);
        Ok(self)
    }

    /// Attach a JSON body when one is given.
    pub fn json_opt<B: Serialize>(self, body: Option<&B>) -> ApiResult<Self> {
        match body {
            Some(body) => self.json(body),
            None => Ok(self),
        }
    }

    /// Route path, segments joined with `/`.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

/// Status codes an operation treats as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedStatus {
    Exactly(u16),
    /// Any 2xx status, 200 through 299 inclusive.
    Success,
}

impl ExpectedStatus {
    pub fn matches(self, status: u16) -> bool {
        match self {
            ExpectedStatus::Exactly(expected) => status == expected,
            ExpectedStatus::Success => (200..=299).contains(&status),
        }
    }
}

/// Result of a call the server accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The body parsed into a record.
    Success(Record),
    /// Success with no body, e.g. `204 No Content`.
    Empty,
}

impl Outcome {
    pub fn record(&self) -> Option<&Record> {
        match self {
            Outcome::Success(record) => Some(record),
            Outcome::Empty => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Outcome::Success(record) => Some(record),
            Outcome::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }
}
