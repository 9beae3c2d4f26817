//! Shared fixtures for unit tests

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::context::AuthContext;
use crate::oauth2::{ProviderConfig, ProviderRegistry, StateSigner};
use crate::session::CacheSessionStore;
use crate::storage::InMemoryCacheStore;
use crate::userdb::{InMemoryAccountStore, User};

pub(crate) const TEST_ORIGIN: &str = "https://app.example.com";

pub(crate) fn test_provider(name: &str, base: &str) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        auth_uri: format!("{base}/{name}/auth"),
        token_uri: format!("{base}/{name}/token"),
        userinfo_uri: Some(format!("{base}/{name}/me")),
        client_id: format!("{name}-client-id"),
        client_secret: format!("{name}-client-secret"),
        scope: "email profile".to_string(),
    }
}

pub(crate) fn test_context_with(settings: Settings, providers: ProviderRegistry) -> AuthContext {
    AuthContext::new(
        settings,
        providers,
        StateSigner::new("unit-test-signing-key"),
        Arc::new(CacheSessionStore::new(
            Box::new(InMemoryCacheStore::new()),
            600,
        )),
        Arc::new(InMemoryAccountStore::new()),
    )
    .expect("test context")
}

pub(crate) fn test_context() -> AuthContext {
    test_context_with(
        Settings::new(TEST_ORIGIN),
        ProviderRegistry::new([
            test_provider("google", "https://idp.example.com"),
            test_provider("facebook", "https://idp.example.com"),
        ]),
    )
}

/// Context with a 1s provider timeout whose providers all point at `base`.
pub(crate) fn short_timeout_context(base: &str) -> AuthContext {
    let mut settings = Settings::new(TEST_ORIGIN);
    settings.http_timeout = Duration::from_secs(1);
    test_context_with(
        settings,
        ProviderRegistry::new([test_provider("google", base), test_provider("facebook", base)]),
    )
}

/// Accepts connections and never answers; returns its base URL.
pub(crate) async fn spawn_silent_listener() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind silent listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

pub(crate) fn test_user(username: &str) -> User {
    let mut user = User::new(username);
    user.email = format!("{username}@example.com");
    user
}
