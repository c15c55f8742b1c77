//! Turns raw responses into `Outcome`s or classified errors.

use crate::diagnostics::{Diagnostics, Event};
use crate::error::{ApiError, ApiResult};
use crate::http::HttpResponse;
use crate::record::Record;
use crate::types::{ExpectedStatus, Outcome};

/// Judge `response` against `expected` and parse its body.
///
/// A status outside `expected` is an `ApiError::Status` carrying the raw
/// body. An expected status with a blank body is `Outcome::Empty`;
/// anything else must be JSON or the call fails with `ApiError::Decode`.
pub fn normalize(
    route: &str,
    response: &HttpResponse,
    expected: ExpectedStatus,
    diagnostics: &dyn Diagnostics,
) -> ApiResult<Outcome> {
    diagnostics.record(Event::Response { route, status: response.status });

    if !expected.matches(response.status) {
        diagnostics.record(Event::UnexpectedStatus {
            route,
            status: response.status,
            body: &response.body,
        });
        return Err(ApiError::Status {
            status: response.status,
            body: response.body.clone(),
        });
    }

    if response.body.trim().is_empty() {
        return Ok(Outcome::Empty);
    }

    match Record::parse(&response.body) {
        Ok(record) => Ok(Outcome::Success(record)),
        Err(e) => {
            let reason = e.to_string();
            diagnostics.record(Event::DecodeFailed { route, reason: &reason });
            Err(ApiError::Decode {
                reason,
                body: response.body.clone(),
            })
        }
    }
}

/// Like `normalize`, but a body is mandatory.
pub fn normalize_record(
    route: &str,
    response: &HttpResponse,
    expected: ExpectedStatus,
    diagnostics: &dyn Diagnostics,
) -> ApiResult<Record> {
    match normalize(route, response, expected, diagnostics)? {
        Outcome::Success(record) => Ok(record),
        Outcome::Empty => {
            let reason = "empty response body".to_string();
            diagnostics.record(Event::DecodeFailed { route, reason: &reason });
            Err(ApiError::Decode {
                reason,
                body: response.body.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use tracing::Level;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn expected_status_parses_body() {
        let diagnostics = RecordingDiagnostics::new();
        let outcome = normalize(
            "/api/v3/groups/1",
            &response(200, r#"{"id": 1, "name": "a"}"#),
            ExpectedStatus::Exactly(200),
            &diagnostics,
        )
        .unwrap();
        let record = outcome.record().unwrap();
        assert_eq!(record["id"].as_i64(), Some(1));
        assert_eq!(record["name"].as_str(), Some("a"));
        assert!(diagnostics.messages_at(Level::ERROR).is_empty());
    }

    #[test]
    fn no_content_is_empty_not_decode_failure() {
        let outcome = normalize(
            "/api/v2/cbw_scans/scripts",
            &response(204, ""),
            ExpectedStatus::Exactly(204),
            &RecordingDiagnostics::new(),
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Empty);
    }

    #[test]
    fn unexpected_status_keeps_body_and_logs() {
        let diagnostics = RecordingDiagnostics::new();
        let err = normalize(
            "/api/v3/groups/1",
            &response(422, r#"{"error":"invalid"}"#),
            ExpectedStatus::Exactly(200),
            &diagnostics,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 422, .. }));
        assert_eq!(err.body(), Some(r#"{"error":"invalid"}"#));
        assert_eq!(diagnostics.messages_at(Level::ERROR).len(), 1);
    }

    #[test]
    fn every_code_outside_the_set_fails() {
        let sets = [
            ExpectedStatus::Exactly(200),
            ExpectedStatus::Exactly(201),
            ExpectedStatus::Exactly(204),
            ExpectedStatus::Success,
        ];
        let diagnostics = RecordingDiagnostics::new();
        for expected in sets {
            for status in [100, 199, 200, 201, 204, 299, 300, 301, 400, 404, 422, 500, 503] {
                let result = normalize("/r", &response(status, "{}"), expected, &diagnostics);
                assert_eq!(result.is_ok(), expected.matches(status), "{expected:?} {status}");
                if let Err(err) = result {
                    assert_eq!(err.body(), Some("{}"));
                }
            }
        }
    }

    #[test]
    fn malformed_json_on_success_is_decode() {
        let err = normalize(
            "/api/v3/servers",
            &response(200, "<html>maintenance</html>"),
            ExpectedStatus::Exactly(200),
            &RecordingDiagnostics::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
        assert_eq!(err.body(), Some("<html>maintenance</html>"));
    }

    #[test]
    fn normalize_record_requires_a_body() {
        let err = normalize_record(
            "/api/v3/ping",
            &response(200, "  "),
            ExpectedStatus::Exactly(200),
            &RecordingDiagnostics::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
