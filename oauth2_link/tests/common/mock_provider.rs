//! Axum-based mock identity provider
//!
//! Each test gets its own server on an ephemeral port, so tests can run in
//! parallel without sharing provider state.

use axum::{
    Form, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Json},
    routing::post,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const MOCK_ACCESS_TOKEN: &str = "mock-access-token";

/// What the mock provider answers with; tests change it between requests.
#[derive(Clone, Debug)]
pub struct MockBehavior {
    pub google_claims: Value,
    pub facebook_profile: Value,
    pub facebook_profile_status: StatusCode,
    pub token_status: StatusCode,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            google_claims: json!({
                "sub": "123",
                "given_name": "John",
                "family_name": "Doe",
                "email": "john@example.com",
                "email_verified": true,
            }),
            facebook_profile: json!({
                "id": "fb-42",
                "first_name": "Jane",
                "last_name": "Roe",
                "email": "jane@example.com",
            }),
            facebook_profile_status: StatusCode::OK,
            token_status: StatusCode::OK,
        }
    }
}

#[derive(Clone, Default)]
struct MockState {
    behavior: Arc<Mutex<MockBehavior>>,
    token_requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

pub struct MockProvider {
    pub base_url: String,
    state: MockState,
}

impl MockProvider {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/google/token", post(google_token))
            .route("/facebook/token", post(facebook_token))
            .route("/facebook/me", post(facebook_me))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock provider");
        let addr = listener.local_addr().expect("Mock provider has no address");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock provider stopped");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn configure(&self, f: impl FnOnce(&mut MockBehavior)) {
        f(&mut self.state.behavior.lock().unwrap());
    }

    /// Form bodies received by the token endpoints, oldest first
    pub fn token_requests(&self) -> Vec<HashMap<String, String>> {
        self.state.token_requests.lock().unwrap().clone()
    }
}

fn id_token(claims: &Value) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        URL_SAFE_NO_PAD.encode("mock-signature")
    )
}

async fn google_token(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    state.token_requests.lock().unwrap().push(form);
    let behavior = state.behavior.lock().unwrap().clone();
    if behavior.token_status != StatusCode::OK {
        return (behavior.token_status, Json(json!({"error": "invalid_grant"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": MOCK_ACCESS_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3599,
            "id_token": id_token(&behavior.google_claims),
        })),
    )
}

async fn facebook_token(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    state.token_requests.lock().unwrap().push(form);
    let behavior = state.behavior.lock().unwrap().clone();
    if behavior.token_status != StatusCode::OK {
        return (behavior.token_status, Json(json!({"error": "invalid_grant"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": MOCK_ACCESS_TOKEN,
            "token_type": "bearer",
            "expires_in": 5183944,
        })),
    )
}

async fn facebook_me(State(state): State<MockState>, headers: HeaderMap) -> impl IntoResponse {
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {MOCK_ACCESS_TOKEN}"));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Invalid OAuth access token."}})),
        );
    }

    let behavior = state.behavior.lock().unwrap().clone();
    if behavior.facebook_profile_status != StatusCode::OK {
        return (
            behavior.facebook_profile_status,
            Json(json!({"error": {"message": "Unsupported request"}})),
        );
    }
    (StatusCode::OK, Json(behavior.facebook_profile))
}
