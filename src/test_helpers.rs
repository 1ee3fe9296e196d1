//! Shared fixtures: scratch directories, a canned backend user, and an Axum
//! mock of the Campus Connect API bound to an ephemeral port.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::net::types::BackendUser;

pub const STUDENT_EMAIL: &str = "a@b.com";
pub const ADMIN_EMAIL: &str = "admin@campus.edu";
pub const PASSWORD: &str = "pw";
pub const STUDENT_TOKEN: &str = "T";
pub const ADMIN_TOKEN: &str = "ADMIN-T";
pub const REGISTER_TOKEN: &str = "REG-T";

// =============================================================================
// SCRATCH DIR
// =============================================================================

/// Unique temp directory removed on drop.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(label: &str) -> Self {
        let suffix: u64 = rand::random();
        let path = std::env::temp_dir().join(format!("campus-session-{label}-{suffix:016x}"));
        std::fs::create_dir_all(&path).expect("scratch dir should be creatable");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn backend_user(role: &str) -> BackendUser {
    BackendUser {
        id: "42".to_owned(),
        username: "ada".to_owned(),
        email: STUDENT_EMAIL.to_owned(),
        first_name: "Ada".to_owned(),
        last_name: "Byron".to_owned(),
        role: role.to_owned(),
        department: None,
        year: None,
    }
}

// =============================================================================
// MOCK BACKEND
// =============================================================================

#[derive(Default)]
struct BackendCounters {
    login_calls: AtomicUsize,
    data_calls: AtomicUsize,
}

/// Running mock backend. The server task lives until the test runtime shuts down.
pub struct MockBackend {
    pub base_url: String,
    counters: Arc<BackendCounters>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let counters = Arc::new(BackendCounters::default());
        let app = Router::new()
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/auth/register", post(register))
            .route("/api/v1/auth/me", get(me))
            .route("/api/v1/auth/refresh", post(refresh))
            .route("/api/v1/events", get(events))
            .route("/api/v1/events/1", delete(no_content))
            .route("/api/v1/echo", get(echo_headers).put(echo_body))
            .route("/api/v1/plain-error", get(plain_error))
            .route("/api/v1/json-error-without-message", get(json_error_without_message))
            .route("/api/v1/not-json", get(not_json))
            .route("/api/v1/actuator/health", get(health))
            .with_state(counters.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("mock backend should bind");
        let addr = listener.local_addr().expect("mock backend should have an address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base_url: format!("http://{addr}/api/v1"), counters }
    }

    pub fn login_calls(&self) -> usize {
        self.counters.login_calls.load(Ordering::SeqCst)
    }

    pub fn data_calls(&self) -> usize {
        self.counters.data_calls.load(Ordering::SeqCst)
    }
}

/// A base URL nothing listens on.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:1/api/v1";

fn user_json(email: &str, role: &str, first: &str, last: &str) -> Value {
    json!({
        "id": 42,
        "username": email.split('@').next().unwrap_or_default(),
        "email": email,
        "firstName": first,
        "lastName": last,
        "role": role
    })
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn login(State(counters): State<Arc<BackendCounters>>, Json(body): Json<Value>) -> Response {
    counters.login_calls.fetch_add(1, Ordering::SeqCst);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match (email, password) {
        (STUDENT_EMAIL, PASSWORD) => Json(json!({
            "token": STUDENT_TOKEN,
            "refreshToken": "R",
            "user": user_json(email, "STUDENT", "Ada", "Byron")
        }))
        .into_response(),
        (ADMIN_EMAIL, PASSWORD) => Json(json!({
            "token": ADMIN_TOKEN,
            "refreshToken": "R2",
            "user": user_json(email, "ADMIN", "Grace", "Hopper")
        }))
        .into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials", "status": 401 })))
            .into_response(),
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if email == STUDENT_EMAIL {
        return (StatusCode::CONFLICT, Json(json!({ "message": "Email is already in use" }))).into_response();
    }
    let first = body["firstName"].as_str().unwrap_or_default();
    let last = body["lastName"].as_str().unwrap_or_default();
    (
        StatusCode::CREATED,
        Json(json!({
            "token": REGISTER_TOKEN,
            "refreshToken": "R3",
            "user": user_json(email, "STUDENT", first, last)
        })),
    )
        .into_response()
}

async fn me(State(counters): State<Arc<BackendCounters>>, headers: HeaderMap) -> Response {
    counters.data_calls.fetch_add(1, Ordering::SeqCst);
    match bearer(&headers) {
        Some(STUDENT_TOKEN | REGISTER_TOKEN) => Json(user_json(STUDENT_EMAIL, "STUDENT", "Ada", "Byron")).into_response(),
        Some(ADMIN_TOKEN) => Json(user_json(ADMIN_EMAIL, "ADMIN", "Grace", "Hopper")).into_response(),
        _ => unauthorized(),
    }
}

async fn refresh() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Refresh token expired" }))).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Full authentication is required to access this resource" })),
    )
        .into_response()
}

async fn events(State(counters): State<Arc<BackendCounters>>, headers: HeaderMap) -> Response {
    counters.data_calls.fetch_add(1, Ordering::SeqCst);
    match bearer(&headers) {
        Some(STUDENT_TOKEN | ADMIN_TOKEN | REGISTER_TOKEN) => {
            Json(json!([{ "id": 1, "title": "Hackathon" }])).into_response()
        }
        _ => unauthorized(),
    }
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "authorization": header_str(&headers, AUTHORIZATION),
        "contentType": header_str(&headers, CONTENT_TYPE),
    }))
}

async fn echo_body(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn plain_error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn json_error_without_message() -> (StatusCode, Json<Value>) {
    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": 503 })))
}

async fn not_json() -> &'static str {
    "hello"
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}
