//! Check request signing, link parsing and response normalization against
//! the JSON test vectors stored in `test-vectors/`.
//!
//! The expected signatures were produced independently of this crate, so a
//! regression in the canonical string or the HMAC shows up here even when
//! the client and the mock server drift together.

use cbw_core::normalize::normalize;
use cbw_core::pager::next_page;
use cbw_core::{
    ApiError, CbwClient, ClientConfig, Endpoint, ExpectedStatus, FixedClock, HttpMethod, HttpResponse,
    Outcome, Params, RecordingDiagnostics,
};
use chrono::{DateTime, Utc};
use serde_json::Value;

const BASE_URL: &str = "https://cbw.local";

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_expected(value: &Value) -> ExpectedStatus {
    match value {
        Value::String(s) if s == "2xx" => ExpectedStatus::Success,
        Value::Number(n) => ExpectedStatus::Exactly(n.as_u64().unwrap() as u16),
        other => panic!("unknown expected status: {other}"),
    }
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

#[test]
fn signing_vectors() {
    let vectors: Value = serde_json::from_str(include_str!("../../test-vectors/signing.json")).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let now: DateTime<Utc> = case["timestamp"].as_str().unwrap().parse().unwrap();
        let client = CbwClient::new(ClientConfig::new(
            BASE_URL,
            case["api_key"].as_str().unwrap(),
            case["secret_key"].as_str().unwrap(),
        ))
        .with_clock(FixedClock(now));

        let input = &case["input"];
        let segments = input["segments"].as_array().unwrap();
        let mut endpoint = Endpoint::new(
            parse_method(input["method"].as_str().unwrap()),
            segments[0].as_str().unwrap(),
        );
        for segment in &segments[1..] {
            endpoint = endpoint.segment(segment.as_str().unwrap());
        }
        let query: Params = serde_json::from_value(input["query"].clone()).unwrap();
        endpoint = endpoint.query(&query);
        if !input["body"].is_null() {
            endpoint = endpoint.json(&input["body"]).unwrap();
        }

        let request = client.build_request(&endpoint).unwrap();
        let expected = &case["expected_request"];

        assert_eq!(request.url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(request.body.as_deref(), expected["body"].as_str(), "{name}: body");
        for (key, value) in expected["headers"].as_object().unwrap() {
            assert_eq!(header(&request.headers, key), value.as_str(), "{name}: header {key}");
        }
    }
}

#[test]
fn signing_vectors_canonical_strings() {
    let vectors: Value = serde_json::from_str(include_str!("../../test-vectors/signing.json")).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected_request"];
        let headers = &expected["headers"];
        let path_and_query = expected["url"].as_str().unwrap().trim_start_matches(BASE_URL);

        let canonical = cbw_core::signer::canonical_string(
            parse_method(case["input"]["method"].as_str().unwrap()),
            headers["Content-Type"].as_str().unwrap(),
            headers["Content-MD5"].as_str().unwrap_or(""),
            path_and_query,
            headers["Date"].as_str().unwrap(),
        );
        assert_eq!(canonical, expected["canonical"].as_str().unwrap(), "{name}: canonical");
    }
}

// ---------------------------------------------------------------------------
// Link headers
// ---------------------------------------------------------------------------

#[test]
fn link_vectors() {
    let vectors: Value = serde_json::from_str(include_str!("../../test-vectors/links.json")).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let headers = case["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|pair| {
                (
                    pair[0].as_str().unwrap().to_string(),
                    pair[1].as_str().unwrap().to_string(),
                )
            })
            .collect();
        let response = HttpResponse {
            status: 200,
            headers,
            body: "[]".to_string(),
        };

        let result = next_page(&response);
        if case.get("expected_error").is_some() {
            assert!(matches!(result, Err(ApiError::Pagination(_))), "{name}: expected pagination error");
        } else {
            assert_eq!(
                result.unwrap().as_deref(),
                case["expected_next"].as_str(),
                "{name}: next page"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[test]
fn normalize_vectors() {
    let vectors: Value = serde_json::from_str(include_str!("../../test-vectors/normalize.json")).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let body = case["body"].as_str().unwrap();
        let response = HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        };
        let diagnostics = RecordingDiagnostics::new();

        let result = normalize("/api/v3/servers", &response, parse_expected(&case["expected"]), &diagnostics);
        match case["outcome"].as_str().unwrap() {
            "Success" => {
                let record = result.unwrap().into_record().unwrap();
                let expected: Value = serde_json::from_str(body).unwrap();
                assert_eq!(record.to_value(), expected, "{name}: record");
            }
            "Empty" => assert_eq!(result.unwrap(), Outcome::Empty, "{name}: outcome"),
            "Status" => match result {
                Err(ApiError::Status { status: got, body: raw }) => {
                    assert_eq!(got, status, "{name}: status");
                    assert_eq!(raw, body, "{name}: body kept verbatim");
                }
                other => panic!("{name}: expected status error, got {other:?}"),
            },
            "Decode" => match result {
                Err(ApiError::Decode { body: raw, .. }) => assert_eq!(raw, body, "{name}: body"),
                other => panic!("{name}: expected decode error, got {other:?}"),
            },
            other => panic!("{name}: unknown outcome {other}"),
        }
    }
}
