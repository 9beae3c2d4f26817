use std::collections::BTreeMap;

use crate::config::{ConfigError, required};

use super::errors::OAuth2Error;

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_SCOPE: &str = "openid email profile";

const FACEBOOK_AUTH_URI: &str = "https://www.facebook.com/v18.0/dialog/oauth";
const FACEBOOK_TOKEN_URI: &str = "https://graph.facebook.com/v18.0/oauth/access_token";
const FACEBOOK_USERINFO_URI: &str =
    "https://graph.facebook.com/me?fields=id,first_name,last_name,email";
const FACEBOOK_SCOPE: &str = "email public_profile";

/// Endpoints and client credentials for one identity provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub auth_uri: String,
    pub token_uri: String,
    /// Profile endpoint for providers whose token response carries no identity token
    pub userinfo_uri: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .field("userinfo_uri", &self.userinfo_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

impl ProviderConfig {
    /// Reads `OAUTH2_<NAME>_*` variables, falling back to built-in endpoints
    /// for the providers this crate knows about.
    pub fn from_env(name: &str) -> Result<Self, ConfigError> {
        let name = name.trim().to_lowercase();
        let upper = name.to_uppercase();
        let var = |suffix: &str| std::env::var(format!("OAUTH2_{upper}_{suffix}")).ok();

        let (auth_uri, token_uri, userinfo_uri, scope) = match name.as_str() {
            "google" => (Some(GOOGLE_AUTH_URI), Some(GOOGLE_TOKEN_URI), None, GOOGLE_SCOPE),
            "facebook" => (
                Some(FACEBOOK_AUTH_URI),
                Some(FACEBOOK_TOKEN_URI),
                Some(FACEBOOK_USERINFO_URI),
                FACEBOOK_SCOPE,
            ),
            _ => (None, None, None, ""),
        };

        let endpoint = |suffix: &str, default: Option<&str>| {
            var(suffix)
                .or_else(|| default.map(str::to_string))
                .ok_or_else(|| ConfigError::Missing(format!("OAUTH2_{upper}_{suffix}")))
        };

        Ok(Self {
            auth_uri: endpoint("AUTH_URI", auth_uri)?,
            token_uri: endpoint("TOKEN_URI", token_uri)?,
            userinfo_uri: var("USERINFO_URI").or_else(|| userinfo_uri.map(str::to_string)),
            client_id: required(&format!("OAUTH2_{upper}_CLIENT_ID"))?,
            client_secret: required(&format!("OAUTH2_{upper}_CLIENT_SECRET"))?,
            scope: var("SCOPE").unwrap_or_else(|| scope.to_string()),
            name,
        })
    }
}

/// Read-only map of configured providers, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new(providers: impl IntoIterator<Item = ProviderConfig>) -> Self {
        Self {
            providers: providers
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }

    /// Builds the registry from `OAUTH2_PROVIDERS` (comma separated, default `google`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let names = std::env::var("OAUTH2_PROVIDERS").unwrap_or_else(|_| "google".to_string());
        let providers = names
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(ProviderConfig::from_env)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            "Configured OAuth2 providers: {:?}",
            providers.iter().map(|p| p.name.as_str()).collect::<Vec<_>>()
        );
        Ok(Self::new(providers))
    }

    pub fn lookup(&self, name: &str) -> Result<&ProviderConfig, OAuth2Error> {
        self.providers
            .get(name)
            .ok_or_else(|| OAuth2Error::ProviderNotFound(name.to_string()))
    }

    /// Provider names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}
