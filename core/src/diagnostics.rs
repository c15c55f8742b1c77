//! Pipeline diagnostics.
//!
//! # Design
//! The request pipeline never calls a global logger. It reports `Event`s
//! to the `Diagnostics` collaborator the client was built with.
//! `TracingDiagnostics` forwards them to `tracing`, which is what
//! applications normally want; `RecordingDiagnostics` keeps them in memory
//! so tests can assert on what was reported.

use std::fmt;
use std::sync::Mutex;

use tracing::{debug, error, warn, Level};

use crate::http::HttpMethod;

/// Something the pipeline wants to report.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    Request { method: HttpMethod, route: &'a str },
    Response { route: &'a str, status: u16 },
    ConnectivityFailed { route: &'a str, reason: &'a str },
    ConfigurationInvalid { route: &'a str, reason: &'a str },
    UnexpectedStatus { route: &'a str, status: u16, body: &'a str },
    DecodeFailed { route: &'a str, reason: &'a str },
    PageFetched { route: &'a str, page: Option<&'a str>, items: usize },
    MissingIdentifier { what: &'static str },
}

impl Event<'_> {
    pub fn level(&self) -> Level {
        match self {
            Event::Request { .. } | Event::Response { .. } | Event::PageFetched { .. } => Level::DEBUG,
            Event::ConnectivityFailed { .. } => Level::WARN,
            Event::ConfigurationInvalid { .. }
            | Event::UnexpectedStatus { .. }
            | Event::DecodeFailed { .. }
            | Event::MissingIdentifier { .. } => Level::ERROR,
        }
    }
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Request { method, route } => write!(f, "{method} {route}"),
            Event::Response { route, status } => write!(f, "{status} from {route}"),
            Event::ConnectivityFailed { route, reason } => {
                write!(f, "an error occurred when requesting {route}: {reason}")
            }
            Event::ConfigurationInvalid { route, reason } => {
                write!(f, "cannot request {route}, check the API URL: {reason}")
            }
            Event::UnexpectedStatus { route, status, body } => {
                write!(f, "unexpected status {status} from {route}: {body}")
            }
            Event::DecodeFailed { route, reason } => {
                write!(f, "could not parse response from {route}: {reason}")
            }
            Event::PageFetched { route, page, items } => {
                write!(f, "page {} of {route}: {items} items", page.unwrap_or("1"))
            }
            Event::MissingIdentifier { what } => write!(f, "no {what} supplied"),
        }
    }
}

/// Receiver for pipeline events.
pub trait Diagnostics: Send + Sync {
    fn record(&self, event: Event<'_>);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: Event<'_>) {
        match event {
            Event::Request { method, route } => debug!(%method, route, "sending request"),
            Event::Response { route, status } => debug!(route, status, "response received"),
            Event::PageFetched { route, page, items } => {
                debug!(route, page = page.unwrap_or("1"), items, "page fetched")
            }
            Event::ConnectivityFailed { route, reason } => {
                warn!(route, reason, "an error occurred when requesting route")
            }
            Event::ConfigurationInvalid { route, reason } => {
                error!(route, reason, "invalid API URL")
            }
            Event::UnexpectedStatus { route, status, body } => {
                error!(route, status, body, "unexpected response status")
            }
            Event::DecodeFailed { route, reason } => {
                error!(route, reason, "an error occurred while parsing response")
            }
            Event::MissingIdentifier { what } => error!(what, "missing identifier"),
        }
    }
}

/// Keeps every event as `(level, message)` for later inspection.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<(Level, String)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Level, String)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages recorded at `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record(&self, event: Event<'_>) {
        if let Ok(mut events) = self.events.lock() {
            events.push((event.level(), event.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_follow_severity() {
        assert_eq!(Event::Response { route: "/r", status: 200 }.level(), Level::DEBUG);
        assert_eq!(Event::ConnectivityFailed { route: "/r", reason: "refused" }.level(), Level::WARN);
        assert_eq!(
            Event::UnexpectedStatus { route: "/r", status: 500, body: "" }.level(),
            Level::ERROR
        );
    }

    #[test]
    fn recording_keeps_order_and_text() {
        let diagnostics = RecordingDiagnostics::new();
        diagnostics.record(Event::Request { method: HttpMethod::Get, route: "/api/v3/ping" });
        diagnostics.record(Event::UnexpectedStatus {
            route: "/api/v3/ping",
            status: 401,
            body: "denied",
        });

        let events = diagnostics.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], (Level::DEBUG, "GET /api/v3/ping".to_string()));
        assert_eq!(
            diagnostics.messages_at(Level::ERROR),
            vec!["unexpected status 401 from /api/v3/ping: denied".to_string()]
        );
    }
}
