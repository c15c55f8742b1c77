//! Client configuration.

use std::time::Duration;

use crate::error::{ApiError, ApiResult};

pub const ENV_API_URL: &str = "CBW_API_URL";
pub const ENV_API_KEY: &str = "CBW_API_KEY";
pub const ENV_SECRET_KEY: &str = "CBW_SECRET_KEY";
pub const ENV_VERIFY_SSL: &str = "CBW_VERIFY_SSL";

/// Connection settings shared by every call a client makes.
///
/// Read-only after construction; clone it to hand the same settings to
/// clients on other threads.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL including scheme, e.g. `https://cbw.example.com`.
    pub api_url: String,
    pub api_key: String,
    pub secret_key: String,
    /// Verify the server's TLS certificate. On unless explicitly disabled.
    pub verify_tls: bool,
    /// Upper bound for a single round-trip, connect included.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_url: &str, api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            verify_tls: true,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `CBW_API_URL`, `CBW_API_KEY`, `CBW_SECRET_KEY` and the optional
    /// `CBW_VERIFY_SSL` from the process environment.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::Configuration(format!("{name} is not set")))
        };
        let mut config = Self::new(
            &required(ENV_API_URL)?,
            required(ENV_API_KEY)?,
            required(ENV_SECRET_KEY)?,
        );
        if let Some(raw) = lookup(ENV_VERIFY_SSL) {
            config.verify_tls = parse_flag(&raw).ok_or_else(|| {
                ApiError::Configuration(format!("{ENV_VERIFY_SSL} must be true or false, got {raw:?}"))
            })?;
        }
        Ok(config)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn new_trims_trailing_slash_and_verifies_tls() {
        let config = ClientConfig::new("https://cbw.local/", "key", "secret");
        assert_eq!(config.api_url, "https://cbw.local");
        assert!(config.verify_tls);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn from_env_reads_all_fields() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://cbw.local"),
            (ENV_API_KEY, "key"),
            (ENV_SECRET_KEY, "secret"),
            (ENV_VERIFY_SSL, "false"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "key");
        assert_eq!(config.secret_key, "secret");
        assert!(!config.verify_tls);
    }

    #[test]
    fn from_env_requires_credentials() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_API_URL, "https://cbw.local"), (ENV_API_KEY, "key")]))
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains(ENV_SECRET_KEY));
    }

    #[test]
    fn from_env_rejects_unknown_flag() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://cbw.local"),
            (ENV_API_KEY, "key"),
            (ENV_SECRET_KEY, "secret"),
            (ENV_VERIFY_SSL, "maybe"),
        ]))
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", ClientConfig::new("https://cbw.local", "key", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
