// In-process mock of the exchange backend for integration tests

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify};

use midas_client::auth::{AuthSession, CredentialStore};
use midas_client::http_client::{ApiClient, ClientOptions};
use midas_client::models::User;

/// One request as seen by the mock backend
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

/// Mock behaviour, fixed at startup
#[derive(Clone)]
pub struct BackendConfig {
    /// Access token the backend currently accepts
    pub accepted_token: String,
    /// Refresh token the backend accepts
    pub refresh_token: String,
    /// Access token handed out by a successful refresh
    pub issued_token: String,
    /// Hold every refresh call until notified
    pub refresh_gate: Option<Arc<Notify>>,
    /// How long `/auth/logout` takes to answer
    pub logout_delay: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            accepted_token: "tok_current".to_string(),
            refresh_token: "rt_1".to_string(),
            issued_token: "tok_new".to_string(),
            refresh_gate: None,
            logout_delay: Duration::ZERO,
        }
    }
}

pub struct BackendState {
    config: BackendConfig,
    accepted_token: Mutex<String>,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    requests: Mutex<Vec<Recorded>>,
}

impl BackendState {
    fn record(&self, method: &Method, path: &str, headers: &HeaderMap) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        self.requests.lock().unwrap().push(Recorded {
            method: method.to_string(),
            path: path.to_string(),
            authorization,
        });
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.accepted_token.lock().unwrap());
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == expected)
            .unwrap_or(false)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_count(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

pub struct MockBackend {
    pub state: Arc<BackendState>,
    url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    pub async fn start(config: BackendConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let state = Arc::new(BackendState {
            accepted_token: Mutex::new(config.accepted_token.clone()),
            config,
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/auth/refresh", post(handle_refresh))
            .route("/auth/logout", post(handle_logout))
            .route("/auth/login", post(handle_login))
            .route("/auth/me", get(handle_me))
            .route("/exchange-rates", get(handle_public_pairs))
            .route("/forbidden", get(handle_forbidden))
            .route("/always-401", get(handle_always_unauthorized))
            .route("/slow-401", get(handle_slow_unauthorized))
            .fallback(handle_protected)
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Self {
            state,
            url: format!("http://127.0.0.1:{}", port),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "error": "token expired"})),
    )
        .into_response()
}

async fn handle_refresh(
    State(state): State<Arc<BackendState>>,
    method: Method,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(&method, "/auth/refresh", &headers);
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    if let Some(ref gate) = state.config.refresh_gate {
        gate.notified().await;
    }

    if body["refresh_token"] != state.config.refresh_token.as_str() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "invalid refresh token"})),
        )
            .into_response();
    }

    let issued = state.config.issued_token.clone();
    *state.accepted_token.lock().unwrap() = issued.clone();
    Json(json!({"success": true, "data": {"access_token": issued}})).into_response()
}

async fn handle_logout(
    State(state): State<Arc<BackendState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    state.record(&method, "/auth/logout", &headers);
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.config.logout_delay).await;
    Json(json!({"success": true})).into_response()
}

async fn handle_login(
    State(state): State<Arc<BackendState>>,
    method: Method,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(&method, "/auth/login", &headers);

    if body["password"] != "correct horse" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "Invalid credentials"})),
        )
            .into_response();
    }

    let token = state.accepted_token.lock().unwrap().clone();
    Json(json!({
        "success": true,
        "data": {
            "access_token": token,
            "refresh_token": state.config.refresh_token,
            "user": user_json(body["email"].as_str().unwrap_or("ada@example.com")),
        }
    }))
    .into_response()
}

async fn handle_me(
    State(state): State<Arc<BackendState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    state.record(&method, "/auth/me", &headers);
    if !state.is_authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"success": true, "data": user_json("ada@example.com")})).into_response()
}

async fn handle_public_pairs(
    State(state): State<Arc<BackendState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    state.record(&method, "/exchange-rates", &headers);
    Json(json!({"success": true, "data": []})).into_response()
}

async fn handle_forbidden(
    State(state): State<Arc<BackendState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    state.record(&method, "/forbidden", &headers);
    (
        StatusCode::FORBIDDEN,
        Json(json!({"success": false, "error": "User is blocked"})),
    )
        .into_response()
}

async fn handle_always_unauthorized(
    State(state): State<Arc<BackendState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    state.record(&method, "/always-401", &headers);
    unauthorized()
}

/// 401 that arrives well after the request was sent
async fn handle_slow_unauthorized(
    State(state): State<Arc<BackendState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    state.record(&method, "/slow-401", &headers);
    tokio::time::sleep(Duration::from_millis(150)).await;
    unauthorized()
}

async fn handle_protected(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let path = uri.path().to_string();
    state.record(&method, &path, &headers);
    if !state.is_authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"success": true, "data": {"path": path}})).into_response()
}

pub fn user_json(email: &str) -> Value {
    json!({
        "id": 42,
        "email": email,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "role": "user",
        "is_active": true,
        "is_verified": true,
        "created_at": "2025-01-12T10:30:00Z",
        "updated_at": "2025-01-12T10:30:00Z"
    })
}

/// Store holding `access_token` / `refresh_token` as a signed-in session
pub fn signed_in_store(access_token: &str, refresh_token: &str) -> Arc<CredentialStore> {
    let user: User = serde_json::from_value(user_json("ada@example.com")).unwrap();
    let store = CredentialStore::in_memory();
    store.set_session(AuthSession {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.to_string(),
        user,
    });
    Arc::new(store)
}

/// Client plus a counter of login redirects
pub fn client_for(
    url: &str,
    store: Arc<CredentialStore>,
    refresh_timeout: Duration,
) -> (Arc<ApiClient>, Arc<AtomicUsize>) {
    let redirects = Arc::new(AtomicUsize::new(0));
    let counter = redirects.clone();

    let mut options = ClientOptions::new(url);
    options.request_timeout = Duration::from_secs(5);
    options.connect_timeout = Duration::from_secs(2);
    options.refresh_timeout = refresh_timeout;

    let client = ApiClient::new(
        options,
        store,
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    )
    .expect("Failed to create API client");

    (Arc::new(client), redirects)
}

/// Poll `condition` until it holds, failing the test after five seconds
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
