//! Shared setup for the router and extractor tests

use axum::{Json, Router, http::StatusCode, routing::post};
use serde_json::json;
use std::sync::Arc;

use oauth2_link::{
    AuthContext, CacheSessionStore, InMemoryAccountStore, InMemoryCacheStore, ProviderConfig,
    ProviderRegistry, SessionKey, Settings, StateSigner, User,
};

/// Identity token whose claims are
/// `{"sub":"123","given_name":"John","family_name":"Doe","email":"jd@example.com"}`
const GOOGLE_ID_TOKEN: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiIxMjMiLCJnaXZlbl9uYW1lIjoiSm9obiIsImZhbWlseV9uYW1lIjoiRG9lIiwiZW1haWwiOiJqZEBleGFtcGxlLmNvbSJ9.c2ln";

fn provider(name: &str, base_url: &str) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        auth_uri: format!("{base_url}/{name}/auth"),
        token_uri: format!("{base_url}/{name}/token"),
        userinfo_uri: (name == "facebook").then(|| format!("{base_url}/{name}/me")),
        client_id: format!("{name}-client-id"),
        client_secret: format!("{name}-client-secret"),
        scope: "email profile".to_string(),
    }
}

/// Context with in-memory stores and google/facebook pointing at `base_url`.
pub(crate) fn test_context(base_url: &str) -> AuthContext {
    AuthContext::new(
        Settings::new("https://app.example.com"),
        ProviderRegistry::new([provider("google", base_url), provider("facebook", base_url)]),
        StateSigner::new("router-test-signing-key"),
        Arc::new(CacheSessionStore::new(
            Box::new(InMemoryCacheStore::new()),
            600,
        )),
        Arc::new(InMemoryAccountStore::new()),
    )
    .unwrap()
}

/// Creates `username` and a session for it; returns the `Cookie` header value.
pub(crate) async fn login_as(ctx: &AuthContext, username: &str) -> (User, String) {
    let user = ctx
        .accounts
        .create_user_with_link(User::new(username), None)
        .await
        .unwrap();
    let session_id = format!("session-{username}");
    ctx.sessions
        .set(&session_id, SessionKey::UserId, &user.id)
        .await
        .unwrap();
    (
        user,
        format!("{}={session_id}", ctx.settings.session_cookie_name),
    )
}

/// Provider whose google login succeeds and whose facebook profile endpoint fails.
pub(crate) async fn spawn_mock_provider() -> String {
    let app = Router::new()
        .route(
            "/google/token",
            post(|| async {
                Json(json!({
                    "access_token": "mock-access-token",
                    "token_type": "Bearer",
                    "id_token": GOOGLE_ID_TOKEN,
                }))
            }),
        )
        .route(
            "/facebook/token",
            post(|| async { Json(json!({"access_token": "mock-access-token"})) }),
        )
        .route(
            "/facebook/me",
            post(|| async { (StatusCode::BAD_REQUEST, Json(json!({"error": "bad"}))) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
