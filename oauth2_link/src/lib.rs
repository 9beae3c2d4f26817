//! oauth2_link - OAuth2 authorization-code login and identity linking engine
//!
//! This crate validates the OAuth2 round trip, exchanges authorization codes,
//! normalizes the provider's identity and links it to a local account.
//! It is framework independent; `oauth2_link_axum` exposes it over HTTP.

mod config;
mod context;
mod coordination;
mod oauth2;
mod session;
mod storage;
mod userdb;
mod utils;

#[cfg(test)]
mod test_utils;

pub use config::{ConfigError, O2L_ROUTE_PREFIX, Settings};
pub use context::AuthContext;

pub use coordination::{
    CallbackOutcome, CoordinationError, LinkSummaries, LinkSummary, activate_account,
    delete_link_core, handle_oauth2_callback, list_links_core, provider_directory,
};

pub use oauth2::{
    AuthResponse, NormalizedIdentity, OAuth2Error, ProviderConfig, ProviderRegistry, StateSigner,
    StateTokenError, prepare_oauth2_auth_request,
};

pub use session::{
    CacheSessionStore, SESSION_COOKIE_NAME, SessionError, SessionKey, SessionStore, current_user,
    get_session_id_from_headers, logout,
};

pub use storage::{
    CacheData, CacheStore, DataStore, InMemoryCacheStore, PostgresDataStore, RedisCacheStore,
    SqliteDataStore, StorageError, cache_store_from_env, data_store_from_env,
};

pub use userdb::{
    AccountStore, IdentityLink, InMemoryAccountStore, OAuthLinks, SqlAccountStore, User,
    UserError, account_store_from_env,
};

pub use utils::UtilError;

/// Builds the shared context from the environment.
///
/// Loads `.env` if present, then reads settings, providers and store
/// selection. See [`AuthContext::from_env`].
pub async fn init() -> Result<AuthContext, Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();
    AuthContext::from_env().await
}
