//! Test utilities: an in-process mock of the provider's cloud
//!
//! `MockProvider` scripts the login realm (callback handshake, authorize
//! redirect, token endpoint) and the telemetry API behind a real HTTP
//! surface, with per-endpoint hit counters so tests can assert exactly how
//! many network exchanges a call performed. `TestServer` binds it to an
//! ephemeral port and shuts down when dropped.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Form, Json, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::config::CloudConfig;

/// Account uuid every mock-issued ID token carries
pub const TEST_UUID: &str = "9a8b7c6d-5e4f-4a3b-2c1d-0e9f8a7b6c5d";
/// VIN the telemetry fixtures answer for
pub const TEST_VIN: &str = "12345678912345678";

/// How the scripted login realm treats submitted credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginScenario {
    /// Handshake converges and tokens are issued
    Success,
    /// Realm answers the submitted document with a `User Not Found` callback
    InvalidUsername,
    /// Realm rejects the submitted document with HTTP 401
    WrongPassword,
}

/// Shared state of the scripted provider
#[derive(Debug)]
pub struct MockProvider {
    login: Mutex<LoginScenario>,
    refresh_ok: AtomicBool,
    authenticate_hits: AtomicUsize,
    authorize_hits: AtomicUsize,
    code_exchange_hits: AtomicUsize,
    refresh_hits: AtomicUsize,
    api_hits: AtomicUsize,
    issued: AtomicUsize,
}

impl MockProvider {
    pub fn new(login: LoginScenario, refresh_ok: bool) -> Arc<Self> {
        Arc::new(Self {
            login: Mutex::new(login),
            refresh_ok: AtomicBool::new(refresh_ok),
            authenticate_hits: AtomicUsize::new(0),
            authorize_hits: AtomicUsize::new(0),
            code_exchange_hits: AtomicUsize::new(0),
            refresh_hits: AtomicUsize::new(0),
            api_hits: AtomicUsize::new(0),
            issued: AtomicUsize::new(0),
        })
    }

    /// Change how the realm treats the next credential submission
    pub fn set_login(&self, scenario: LoginScenario) {
        *self.login.lock() = scenario;
    }

    /// Script the refresh grant to succeed or be rejected
    pub fn set_refresh_ok(&self, ok: bool) {
        self.refresh_ok.store(ok, Ordering::SeqCst);
    }

    /// POSTs to the authenticate endpoint (callback exchanges)
    pub fn authenticate_hits(&self) -> usize {
        self.authenticate_hits.load(Ordering::SeqCst)
    }

    /// GETs to the authorize endpoint
    pub fn authorize_hits(&self) -> usize {
        self.authorize_hits.load(Ordering::SeqCst)
    }

    /// Token-endpoint exchanges with the authorization-code grant
    pub fn code_exchange_hits(&self) -> usize {
        self.code_exchange_hits.load(Ordering::SeqCst)
    }

    /// Token-endpoint exchanges with the refresh-token grant
    pub fn refresh_hits(&self) -> usize {
        self.refresh_hits.load(Ordering::SeqCst)
    }

    /// Telemetry API requests
    pub fn api_hits(&self) -> usize {
        self.api_hits.load(Ordering::SeqCst)
    }

    /// Every provider request seen so far, auth and telemetry alike
    pub fn total_hits(&self) -> usize {
        self.authenticate_hits()
            + self.authorize_hits()
            + self.code_exchange_hits()
            + self.refresh_hits()
            + self.api_hits()
    }

    fn issue_tokens(&self) -> Value {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        json!({
            "access_token": format!("access-token-{n}"),
            "refresh_token": format!("refresh-token-{n}"),
            "id_token": mock_id_token(),
            "token_type": "Bearer",
            "expires_in": 3600
        })
    }
}

/// Signed-looking but unsigned JWT whose payload carries the test uuid
fn mock_id_token() -> String {
    let claims = json!({"sub": "test-user", "uuid": TEST_UUID});
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("e30.{payload}.c2ln")
}

/// Router exposing the scripted login realm and telemetry API
pub fn provider_router(state: Arc<MockProvider>) -> Router {
    Router::new()
        .route(CloudConfig::AUTHENTICATE_PATH, post(authenticate))
        .route(CloudConfig::AUTHORIZE_PATH, get(authorize))
        .route(CloudConfig::TOKEN_PATH, post(token))
        .route("/v2/vehicle/guid", get(vehicles))
        .route("/v1/location", get(location))
        .route("/v3/telemetry", get(telemetry))
        .route("/v2/notification/history", get(notifications))
        .route("/v1/trips", get(trips))
        .with_state(state)
}

fn credential_callbacks() -> Value {
    json!({
        "authId": "auth-1",
        "callbacks": [
            {
                "type": "NameCallback",
                "output": [{"name": "prompt", "value": "User ID"}],
                "input": [{"name": "IDToken1", "value": ""}]
            },
            {
                "type": "PasswordCallback",
                "output": [{"name": "prompt", "value": "Password"}],
                "input": [{"name": "IDToken2", "value": ""}]
            }
        ]
    })
}

async fn authenticate(State(state): State<Arc<MockProvider>>, Json(body): Json<Value>) -> Response {
    state.authenticate_hits.fetch_add(1, Ordering::SeqCst);

    // First exchange: hand out the callbacks to fill.
    if body.get("callbacks").is_none() {
        return Json(credential_callbacks()).into_response();
    }

    // Credentials submitted: script the outcome.
    match *state.login.lock() {
        LoginScenario::Success => {
            Json(json!({"tokenId": "session-token-1", "successUrl": "/"})).into_response()
        }
        LoginScenario::InvalidUsername => Json(json!({
            "authId": "auth-1",
            "callbacks": [{
                "type": "TextOutputCallback",
                "output": [
                    {"name": "message", "value": "User Not Found"},
                    {"name": "messageType", "value": "1"}
                ]
            }]
        }))
        .into_response(),
        LoginScenario::WrongPassword => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "code": 401,
                "reason": "Unauthorized",
                "message": "Authentication Failed"
            })),
        )
            .into_response(),
    }
}

async fn authorize(State(state): State<Arc<MockProvider>>, headers: HeaderMap) -> Response {
    state.authorize_hits.fetch_add(1, Ordering::SeqCst);

    let has_session = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains("iPlanetDirectoryPro=session-token-1"));
    if !has_session {
        return (StatusCode::UNAUTHORIZED, "no realm session").into_response();
    }

    let target = format!("{}?code=auth-code-1&iss=mock", CloudConfig::REDIRECT_URI);
    (StatusCode::FOUND, [(header::LOCATION, target)]).into_response()
}

async fn token(
    State(state): State<Arc<MockProvider>>,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    match params.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            state.code_exchange_hits.fetch_add(1, Ordering::SeqCst);
            if params.get("code").map(String::as_str) != Some("auth-code-1") {
                return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"})))
                    .into_response();
            }
            Json(state.issue_tokens()).into_response()
        }
        Some("refresh_token") => {
            state.refresh_hits.fetch_add(1, Ordering::SeqCst);
            if !state.refresh_ok.load(Ordering::SeqCst) {
                return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"})))
                    .into_response();
            }
            Json(state.issue_tokens()).into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unsupported_grant_type"})),
        )
            .into_response(),
    }
}

/// Bearer + account-guid check shared by all telemetry handlers
fn authorized(headers: &HeaderMap) -> bool {
    let bearer_ok = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer access-token-"));
    let guid_ok = headers
        .get("x-guid")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == TEST_UUID);
    bearer_ok && guid_ok
}

fn envelope(payload: Value) -> Response {
    Json(json!({"payload": payload, "status": {"messages": []}})).into_response()
}

fn api_error(status: StatusCode, code: &str, description: &str) -> Response {
    (
        status,
        Json(json!({
            "status": {"messages": [{"responseCode": code, "description": description}]}
        })),
    )
        .into_response()
}

/// 401 for missing credentials, 404 for a VIN outside the account, payload
/// otherwise. `vin_required` is false for the account-level vehicle list.
fn guarded(state: &MockProvider, headers: &HeaderMap, vin_required: bool, payload: Value) -> Response {
    state.api_hits.fetch_add(1, Ordering::SeqCst);

    if !authorized(headers) {
        return api_error(StatusCode::UNAUTHORIZED, "ONE-401", "Missing or invalid token");
    }
    if vin_required {
        match headers.get("vin").and_then(|v| v.to_str().ok()) {
            Some(TEST_VIN) => {}
            _ => {
                return api_error(
                    StatusCode::NOT_FOUND,
                    "ONE-10004",
                    "Vehicle not associated with account",
                )
            }
        }
    }
    envelope(payload)
}

async fn vehicles(State(state): State<Arc<MockProvider>>, headers: HeaderMap) -> Response {
    guarded(
        &state,
        &headers,
        false,
        json!({
            "vehicles": [{
                "vin": TEST_VIN,
                "nickname": "RAV4",
                "modelName": "RAV4 PHEV",
                "modelYear": 2020,
                "evVehicle": true,
                "fuelType": "petrol"
            }]
        }),
    )
}

async fn location(State(state): State<Arc<MockProvider>>, headers: HeaderMap) -> Response {
    guarded(
        &state,
        &headers,
        true,
        json!({
            "latitude": 50.0,
            "longitude": 0.0,
            "timestamp": "2024-01-01T16:20:20Z"
        }),
    )
}

async fn telemetry(State(state): State<Arc<MockProvider>>, headers: HeaderMap) -> Response {
    guarded(
        &state,
        &headers,
        true,
        json!({
            "odometer": {"value": 9999.975, "unit": "km"},
            "fuelLevel": 10,
            "fuelRange": {"value": 112.654, "unit": "km"},
            "batteryLevel": 22,
            "batteryRange": {"value": 33.0, "unit": "km"},
            "batteryRangeWithAc": {"value": 30.0, "unit": "km"},
            "range": {"value": 100.0, "unit": "km"},
            "warningLights": []
        }),
    )
}

async fn notifications(State(state): State<Arc<MockProvider>>, headers: HeaderMap) -> Response {
    guarded(
        &state,
        &headers,
        true,
        json!({
            "notifications": [
                {
                    "message": "2020 RAV4 PHEV: Climate control was interrupted (Door open) [1]",
                    "type": "alert",
                    "category": "RemoteCommand",
                    "date": "2024-01-03T08:00:00Z"
                },
                {
                    "message": "2020 RAV4 PHEV: Climate was started and will automatically shut off.",
                    "type": "info",
                    "category": "RemoteCommand",
                    "date": "2024-01-02T08:00:00Z"
                },
                {
                    "message": "2020 RAV4 PHEV: Charging Interrupted [4].",
                    "type": "alert",
                    "category": "ChargingAlert",
                    "date": "2024-01-01T08:00:00Z"
                }
            ]
        }),
    )
}

async fn trips(State(state): State<Arc<MockProvider>>, headers: HeaderMap) -> Response {
    guarded(
        &state,
        &headers,
        true,
        json!({
            "trips": [{
                "startTime": "2024-01-01T08:00:00Z",
                "endTime": "2024-01-01T08:25:00Z",
                "distance": 15.215,
                "durationSecs": 1500,
                "evDistance": 10.5,
                "evDurationSecs": 653,
                "averageFuelConsumed": 1.485,
                "score": 65
            }]
        }),
    )
}

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    provider: Arc<MockProvider>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Start a provider scripted for `login`, with the refresh grant working
    pub async fn start(login: LoginScenario) -> std::io::Result<Self> {
        Self::start_with(login, true).await
    }

    /// Start a provider with explicit login and refresh scripting
    pub async fn start_with(login: LoginScenario, refresh_ok: bool) -> std::io::Result<Self> {
        let provider = MockProvider::new(login, refresh_ok);
        let router = provider_router(provider.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            provider,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Base URL tests point [`CloudConfig::single_host`] at
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Scripting and counters
    pub fn provider(&self) -> &Arc<MockProvider> {
        &self.provider
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_token_decodes_to_test_uuid() {
        let token = mock_id_token();
        let payload = token.split('.').nth(1).unwrap();
        let claims: Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(claims["uuid"], TEST_UUID);
    }
}
