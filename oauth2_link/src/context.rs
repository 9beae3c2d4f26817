use std::sync::Arc;

use crate::config::{ConfigError, Settings};
use crate::oauth2::{ProviderRegistry, StateSigner};
use crate::session::{CacheSessionStore, SessionStore};
use crate::storage::cache_store_from_env;
use crate::userdb::{AccountStore, account_store_from_env};
use crate::utils::gen_random_string;

/// Everything a login flow needs, bundled for cheap cloning into request handlers.
#[derive(Clone)]
pub struct AuthContext {
    pub settings: Arc<Settings>,
    pub providers: Arc<ProviderRegistry>,
    pub signer: StateSigner,
    pub sessions: Arc<dyn SessionStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub http: reqwest::Client,
}

impl AuthContext {
    pub fn new(
        settings: Settings,
        providers: ProviderRegistry,
        signer: StateSigner,
        sessions: Arc<dyn SessionStore>,
        accounts: Arc<dyn AccountStore>,
    ) -> Result<Self, ConfigError> {
        let http = http_client(&settings)?;
        Ok(Self {
            settings: Arc::new(settings),
            providers: Arc::new(providers),
            signer,
            sessions,
            accounts,
            http,
        })
    }

    /// Reads settings and providers from the environment and connects the
    /// configured session and account stores.
    pub async fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let settings = Settings::from_env()?;
        let providers = ProviderRegistry::from_env()?;

        let signer = match std::env::var("AUTH_SERVER_SECRET") {
            Ok(secret) if !secret.is_empty() => StateSigner::new(secret),
            _ => {
                tracing::warn!(
                    "AUTH_SERVER_SECRET not set; using a random key, state tokens will not survive restarts"
                );
                StateSigner::new(gen_random_string(32)?)
            }
        };

        let cache = cache_store_from_env().await?;
        let sessions = Arc::new(CacheSessionStore::new(cache, settings.session_max_age));
        let accounts: Arc<dyn AccountStore> = Arc::from(account_store_from_env().await?);

        Ok(Self::new(settings, providers, signer, sessions, accounts)?)
    }
}

/// Outbound client for provider calls.
///
/// The timeout bounds how long a hung provider can hold a callback request.
fn http_client(settings: &Settings) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(settings.http_timeout)
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .build()
        .map_err(|e| ConfigError::Invalid {
            name: "OAUTH2_HTTP_TIMEOUT".to_string(),
            reason: e.to_string(),
        })
}
