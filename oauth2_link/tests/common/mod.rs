//! Shared fixtures for the integration tests

pub mod mock_provider;

use http::{HeaderMap, header::SET_COOKIE};
use std::sync::Arc;

use oauth2_link::{
    AccountStore, AuthContext, AuthResponse, CacheSessionStore, InMemoryAccountStore,
    InMemoryCacheStore, ProviderConfig, ProviderRegistry, Settings, StateSigner,
    prepare_oauth2_auth_request,
};

pub use mock_provider::MockProvider;

pub const TEST_ORIGIN: &str = "https://app.example.com";

pub fn provider(name: &str, base_url: &str) -> ProviderConfig {
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

/// Context wired to `mock` with in-memory sessions and the given account store.
pub fn context_with_accounts(mock: &MockProvider, accounts: Arc<dyn AccountStore>) -> AuthContext {
    let providers = ProviderRegistry::new([
        provider("google", &mock.base_url),
        provider("facebook", &mock.base_url),
    ]);
    let sessions = Arc::new(CacheSessionStore::new(
        Box::new(InMemoryCacheStore::new()),
        600,
    ));
    AuthContext::new(
        Settings::new(TEST_ORIGIN),
        providers,
        StateSigner::new("integration-test-signing-key"),
        sessions,
        accounts,
    )
    .expect("Failed to build test context")
}

pub fn test_context(mock: &MockProvider) -> AuthContext {
    context_with_accounts(mock, Arc::new(InMemoryAccountStore::new()))
}

/// Session id carried by the last `Set-Cookie` for the session cookie.
pub fn session_cookie(ctx: &AuthContext, headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{}=", ctx.settings.session_cookie_name);
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.strip_prefix(&prefix))
        .last()
        .map(str::to_string)
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// A browser that has just been sent to the provider's consent page.
pub struct PendingLogin {
    pub session_id: String,
    pub auth_url: String,
    pub state: String,
}

impl PendingLogin {
    pub fn callback(&self, code: &str) -> AuthResponse {
        AuthResponse {
            code: code.to_string(),
            state: self.state.clone(),
        }
    }
}

/// Starts a login, reusing `session_id` when the browser already has one.
pub async fn start_login(
    ctx: &AuthContext,
    provider: &str,
    session_id: Option<&str>,
    next: Option<&str>,
) -> PendingLogin {
    let (auth_url, headers) = prepare_oauth2_auth_request(ctx, provider, session_id, next)
        .await
        .expect("Failed to prepare authorization request");

    let session_id = match session_id {
        Some(id) => id.to_string(),
        None => session_cookie(ctx, &headers).expect("New session must set a cookie"),
    };
    let state = query_param(&auth_url, "state").expect("Authorization URL carries state");

    PendingLogin {
        session_id,
        auth_url,
        state,
    }
}
