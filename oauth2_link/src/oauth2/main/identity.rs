use crate::context::AuthContext;
use crate::oauth2::config::ProviderConfig;
use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::{NormalizedIdentity, TokenResponse};

use super::{facebook, google};

/// Providers whose token or profile responses this crate knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdentityProvider {
    /// Identity carried in the token response's `id_token`
    Google,
    /// Identity fetched from a profile endpoint with the access token
    Facebook,
}

impl IdentityProvider {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "google" => Some(Self::Google),
            "facebook" => Some(Self::Facebook),
            _ => None,
        }
    }

    pub(crate) async fn normalize(
        self,
        ctx: &AuthContext,
        config: &ProviderConfig,
        token: &TokenResponse,
    ) -> Result<NormalizedIdentity, OAuth2Error> {
        match self {
            Self::Google => google::identity_from_id_token(&config.name, token),
            Self::Facebook => facebook::fetch_profile(ctx, config, token).await,
        }
    }
}
