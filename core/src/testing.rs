//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError};

/// Requests seen by a `ScriptedTransport`, shared with the test body.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<HttpRequest>>>);

impl CallLog {
    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.0.lock().unwrap().clone()
    }
}

/// Replays canned responses in order; errors once the script runs out.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    calls: CallLog,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            calls: CallLog::default(),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([Err(error)])),
            calls: CallLog::default(),
        }
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    pub fn json(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    /// A JSON array page, optionally pointing at a next page.
    pub fn page(ids: std::ops::Range<u32>, next: Option<u32>) -> HttpResponse {
        let items: Vec<serde_json::Value> = ids.map(|id| serde_json::json!({ "id": id })).collect();
        let mut response = Self::json(200, &serde_json::to_string(&items).unwrap());
        if let Some(page) = next {
            response.headers.push((
                "Link".to_string(),
                format!(r#"<https://cbw.local/api/v3/servers?page={page}&per_page=100>; rel="next""#),
            ));
        }
        response
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.0.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connectivity("script exhausted".to_string())))
    }
}
