//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use clinic_records::auth::{auth_gate, AuthGateState};
use clinic_records::domain::{ProfileUpdate, Role};
use clinic_records::metrics::MetricsRegistry;
use clinic_records::server::AppState;
use clinic_records::{
    AuthService, MemoryPatientStore, NewPatient, PatientStore, PublicRoutes, TokenCodec,
};

/// Signing secret shared by every test codec (32 bytes).
pub const TEST_SECRET: &[u8] = b"integration-test-signing-key-32b";

/// Password used by the registration fixtures.
pub const TEST_PASSWORD: &str = "hunter42";

/// Codec over the shared test secret with the default validity window.
pub fn test_codec() -> Arc<TokenCodec> {
    Arc::new(TokenCodec::with_default_validity(TEST_SECRET).unwrap())
}

/// Codec over the shared test secret with an explicit validity window.
///
/// A negative window issues tokens that are already expired.
pub fn test_codec_with_validity(hours: i64) -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(TEST_SECRET, Duration::hours(hours)).unwrap())
}

/// Create application state over an empty in-memory store.
pub fn create_test_state() -> AppState {
    let store: Arc<dyn PatientStore> = Arc::new(MemoryPatientStore::new());
    AppState {
        store: store.clone(),
        auth: AuthService::new(store, test_codec()),
        metrics: Arc::new(MetricsRegistry::new()),
    }
}

/// Create a test router with the request gate wired the way the server wires it.
pub fn create_test_router(state: AppState) -> axum::Router<()> {
    let gate_state = AuthGateState {
        codec: test_codec(),
        store: state.store.clone(),
        public_routes: Arc::new(PublicRoutes::from_csv("/api/v1/auth")),
    };

    let api = clinic_records::api::router().layer(axum::middleware::from_fn_with_state(
        gate_state,
        auth_gate,
    ));

    axum::Router::new()
        .merge(clinic_records::api::ops_router())
        .nest("/api", api)
        .with_state::<()>(state)
}

/// Send a request to the test router.
pub async fn send_request(
    app: &axum::Router<()>,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    bearer: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }

    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let body = body
        .map(|v| Body::from(serde_json::to_vec(&v).unwrap()))
        .unwrap_or_else(|| Body::from(Vec::new()));

    let response = app
        .clone()
        .into_service::<Body>()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec();

    let json = if bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(&bytes) }))
    };

    (status, json)
}

/// Registration request body for the given email.
pub fn register_body(email: &str) -> serde_json::Value {
    json!({
        "name": "Ana",
        "lastName": "Souza",
        "email": email,
        "password": TEST_PASSWORD,
    })
}

/// Login request body matching `register_body`.
pub fn login_body(email: &str) -> serde_json::Value {
    json!({
        "email": email,
        "password": TEST_PASSWORD,
    })
}

/// Register an account through the API, returning `(patient_id, token)`.
pub async fn register_patient(app: &axum::Router<()>, email: &str) -> (String, String) {
    let (status, body) = send_request(
        app,
        Method::POST,
        "/api/v1/auth/register",
        Some(register_body(email)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");

    let patient_id = body["patientId"].as_str().expect("patientId").to_string();
    let token = body["token"].as_str().expect("token").to_string();
    (patient_id, token)
}

/// Create an admin account directly through the service, bypassing the
/// public API (which only ever registers patients). Returns `(id, token)`.
pub async fn create_admin(state: &AppState, email: &str) -> (String, String) {
    let outcome = state
        .auth
        .create_account(
            NewPatient {
                email: email.to_string(),
                password: TEST_PASSWORD.to_string(),
                name: "Root".to_string(),
                last_name: "Admin".to_string(),
                profile: ProfileUpdate::default(),
            },
            Role::Admin,
        )
        .await
        .expect("admin account");
    (outcome.patient.id.to_string(), outcome.token)
}

const BASE64_URL_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Corrupt a token by rewriting the first character of its payload segment.
pub fn tamper_token(token: &str) -> String {
    let dot = token.find('.').expect("token has segments");
    let mut bytes = token.as_bytes().to_vec();
    let idx = BASE64_URL_ALPHABET
        .iter()
        .position(|&c| c == bytes[dot + 1])
        .expect("base64url character") as u8;
    bytes[dot + 1] = BASE64_URL_ALPHABET[(idx ^ 0b10_0000) as usize];
    String::from_utf8(bytes).expect("token is ascii")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tamper_token_changes_payload() {
        let token = "aaaa.bbbb.cccc";
        let tampered = tamper_token(token);
        assert_ne!(token, tampered);
        assert_eq!(token.len(), tampered.len());
        assert_eq!(&tampered[..5], "aaaa.");
        assert_eq!(&tampered[6..], "bbb.cccc");
    }

    #[test]
    fn test_fixture_bodies_agree_on_password() {
        let reg = register_body("a@b.com");
        let login = login_body("a@b.com");
        assert_eq!(reg["password"], login["password"]);
        assert_eq!(reg["email"], login["email"]);
    }
}
