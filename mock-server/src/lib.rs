//! In-memory stand-in for the CBW API.
//!
//! Verifies `CBW-HMAC-SHA256` signatures, paginates collections with
//! `Link: rel="next"` headers and follows the API's status conventions
//! (201 on create, 204 on importer upload, 422 on invalid input). The
//! signature check is written independently of the client so that the
//! integration tests catch drift between the two.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use tokio::{net::TcpListener, sync::RwLock};

const MAX_BODY: usize = 1 << 20;

/// Credentials and seed data for a mock instance.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub api_key: String,
    pub secret_key: String,
    pub servers: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_key: "key".to_string(),
            secret_key: "secret".to_string(),
            servers: 140,
        }
    }
}

#[derive(Default)]
struct Store {
    servers: BTreeMap<u64, Value>,
    groups: BTreeMap<u64, Value>,
    uploads: Vec<Value>,
    next_id: u64,
}

/// Shared state; clone it to keep a handle on the request counter.
#[derive(Clone)]
pub struct AppState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
    requests: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: MockConfig) -> Self {
        let mut store = Store::default();
        for id in 1..=config.servers {
            store.servers.insert(
                id,
                json!({ "id": id, "hostname": format!("server-{id}"), "groups": [] }),
            );
        }
        store.next_id = 1;
        Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(store)),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Authenticated requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub async fn uploads(&self) -> Vec<Value> {
        self.store.read().await.uploads.clone()
    }
}

pub fn app() -> Router {
    app_with(AppState::new(MockConfig::default()))
}

pub fn app_with(state: AppState) -> Router {
    Router::new()
        .route("/api/v3/ping", get(ping))
        .route("/api/v3/servers", get(list_servers))
        .route(
            "/api/v3/servers/{id}",
            get(get_server).patch(update_server).delete(delete_server),
        )
        .route("/api/v3/groups", get(list_groups).post(create_group))
        .route(
            "/api/v3/groups/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route(
            "/api/v2/cbw_scans/scripts",
            get(list_scripts).post(upload_results),
        )
        .layer(middleware::from_fn_with_state(state.clone(), verify_signature))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(state)).await
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

type HmacSha256 = Hmac<Sha256>;

/// Compute the `Authorization` value the client must have sent.
pub fn expected_authorization(
    api_key: &str,
    secret_key: &str,
    method: &str,
    content_type: &str,
    content_md5: &str,
    path_and_query: &str,
    date: &str,
) -> String {
    let canonical = format!("{method},{content_type},{content_md5},{path_and_query},{date}");
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC takes any key size");
    mac.update(canonical.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());
    format!("CBW-HMAC-SHA256 {api_key}:{signature}")
}

async fn verify_signature(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let Ok(bytes) = to_bytes(body, MAX_BODY).await else {
        return StatusCode::PAYLOAD_TOO_LARGE.into_response();
    };

    let header_str = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    };
    let content_md5 = if bytes.is_empty() {
        String::new()
    } else {
        STANDARD.encode(Md5::digest(&bytes))
    };
    if !bytes.is_empty() && header_str("content-md5") != content_md5 {
        return unauthorized("Content-MD5 mismatch");
    }

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    let expected = expected_authorization(
        &state.config.api_key,
        &state.config.secret_key,
        parts.method.as_str(),
        &header_str("content-type"),
        &content_md5,
        &path_and_query,
        &header_str("date"),
    );
    if header_str("authorization") != expected {
        return unauthorized("invalid signature");
    }

    state.requests.fetch_add(1, Ordering::SeqCst);
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn unauthorized(reason: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": reason }))).into_response()
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// Slice `items` to the requested page and advertise the next one.
fn paginate(route: &str, items: Vec<Value>, params: &PageParams) -> Response {
    let per_page = params.per_page.unwrap_or(100).max(1);
    let page = params.page.unwrap_or(1).max(1);
    let start = (page - 1).saturating_mul(per_page).min(items.len());
    let end = (start + per_page).min(items.len());
    let slice: Vec<Value> = items[start..end].to_vec();

    let mut headers = HeaderMap::new();
    if end < items.len() {
        let link = format!(r#"<{route}?page={}&per_page={per_page}>; rel="next""#, page + 1);
        if let Ok(value) = HeaderValue::from_str(&link) {
            headers.insert(header::LINK, value);
        }
    }
    (StatusCode::OK, headers, Json(Value::Array(slice))).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn ping() -> Json<Value> {
    Json(json!({ "uuid": "00000000-0000-0000-0000-000000000000" }))
}

async fn list_servers(State(state): State<AppState>, Query(params): Query<PageParams>) -> Response {
    let servers = state.store.read().await.servers.values().cloned().collect();
    paginate("/api/v3/servers", servers, &params)
}

async fn get_server(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    let store = state.store.read().await;
    store.servers.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_server(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = state.store.write().await;
    let server = store.servers.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    merge(server, &input);
    Ok(Json(server.clone()))
}

async fn delete_server(State(state): State<AppState>, Path(id): Path<u64>) -> StatusCode {
    match state.store.write().await.servers.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn list_groups(State(state): State<AppState>, Query(params): Query<PageParams>) -> Response {
    let groups = state.store.read().await.groups.values().cloned().collect();
    paginate("/api/v3/groups", groups, &params)
}

async fn create_group(State(state): State<AppState>, Json(input): Json<Value>) -> Response {
    let Some(name) = valid_name(&input) else {
        return invalid();
    };
    let mut store = state.store.write().await;
    let id = store.next_id;
    store.next_id += 1;
    let group = json!({
        "id": id,
        "name": name,
        "description": input.get("description").cloned().unwrap_or(Value::Null),
    });
    store.groups.insert(id, group.clone());
    (StatusCode::CREATED, Json(group)).into_response()
}

async fn get_group(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    let store = state.store.read().await;
    store.groups.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_group(State(state): State<AppState>, Path(id): Path<u64>, Json(input): Json<Value>) -> Response {
    if input.get("name").is_some() && valid_name(&input).is_none() {
        return invalid();
    }
    let mut store = state.store.write().await;
    let Some(group) = store.groups.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    merge(group, &input);
    Json(group.clone()).into_response()
}

async fn delete_group(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    let mut store = state.store.write().await;
    store.groups.remove(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn list_scripts() -> Json<Value> {
    Json(json!([
        { "id": 1, "type": "CbwRam::Scripts::Linux::Debian", "filename": "debian.sh" },
        { "id": 2, "type": "CbwRam::Scripts::Windows::Powershell", "filename": "windows.ps1" }
    ]))
}

async fn upload_results(State(state): State<AppState>, Json(input): Json<Value>) -> StatusCode {
    if !input.is_object() {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    state.store.write().await.uploads.push(input);
    StatusCode::NO_CONTENT
}

fn valid_name(input: &Value) -> Option<String> {
    input
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
}

fn invalid() -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": "invalid" }))).into_response()
}

/// Shallow merge of `patch` object fields into `target`; `id` is immutable.
fn merge(target: &mut Value, patch: &Value) {
    let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) else {
        return;
    };
    for (key, value) in patch {
        if key != "id" {
            target.insert(key.clone(), value.clone());
        }
    }
}
