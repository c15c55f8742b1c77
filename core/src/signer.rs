//! CBW-HMAC-SHA256 request signing.
//!
//! The server authenticates each request by recomputing an HMAC over a
//! canonical string:
//!
//! ```text
//! VERB,content-type,content-md5,path?query,date
//! ```
//!
//! and comparing it to the `Authorization` header. The `Date` header
//! bounds replay, so envelopes are built per request and never reused.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;

use crate::http::HttpMethod;

type HmacSha256 = Hmac<Sha256>;

pub const CONTENT_TYPE: &str = "application/json";
pub const AUTH_SCHEME: &str = "CBW-HMAC-SHA256";

/// Source of the request timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant, for reproducible signatures.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Headers proving the caller holds the secret key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEnvelope {
    pub date: String,
    pub content_type: &'static str,
    pub content_md5: Option<String>,
    pub authorization: String,
}

impl SignatureEnvelope {
    pub fn into_headers(self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Content-Type".to_string(), self.content_type.to_string()),
            ("Date".to_string(), self.date),
        ];
        if let Some(md5) = self.content_md5 {
            headers.push(("Content-MD5".to_string(), md5));
        }
        headers.push(("Authorization".to_string(), self.authorization));
        headers
    }
}

/// Holds the key pair; signing itself is stateless.
#[derive(Clone)]
pub struct RequestSigner {
    api_key: String,
    secret_key: String,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl RequestSigner {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Build the envelope for one request.
    ///
    /// `path_and_query` is the URL path plus `?query` when a query string
    /// is present, exactly as it will appear on the request line.
    pub fn sign(
        &self,
        method: HttpMethod,
        path_and_query: &str,
        body: Option<&str>,
        now: DateTime<Utc>,
    ) -> SignatureEnvelope {
        let date = http_date(now);
        let content_md5 = body.map(content_md5);
        let canonical = canonical_string(
            method,
            CONTENT_TYPE,
            content_md5.as_deref().unwrap_or(""),
            path_and_query,
            &date,
        );
        let signature = hmac_sha256_base64(&self.secret_key, &canonical);
        SignatureEnvelope {
            date,
            content_type: CONTENT_TYPE,
            content_md5,
            authorization: format!("{AUTH_SCHEME} {}:{signature}", self.api_key),
        }
    }
}

/// RFC 1123 date in GMT, as used by the `Date` header.
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn canonical_string(
    method: HttpMethod,
    content_type: &str,
    content_md5: &str,
    path_and_query: &str,
    date: &str,
) -> String {
    format!("{method},{content_type},{content_md5},{path_and_query},{date}")
}

/// Base64 of the MD5 digest of the body.
pub fn content_md5(body: &str) -> String {
    STANDARD.encode(Md5::digest(body.as_bytes()))
}

fn hmac_sha256_base64(secret: &str, message: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    mac.update(message.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
