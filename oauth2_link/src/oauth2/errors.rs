use crate::session::SessionError;
use crate::utils::UtilError;
use thiserror::Error;

/// Failures of the redirect and callback flows.
///
/// The `Display` text of the authentication-failure variants is what the
/// client sees; the carried detail is for logs only.
#[derive(Debug, Error, Clone)]
pub enum OAuth2Error {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("State is missing or invalid.")]
    InvalidState(String),

    #[error("State expired.")]
    StateExpired,

    #[error("OAuth code - token exchange failed.")]
    TokenExchange(String),

    #[error("Unable to get user info for OAuth provider {provider}.")]
    FetchUserInfo { provider: String, reason: String },

    #[error("Serde error: {0}")]
    Serde(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),

    /// Error from session operations
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl OAuth2Error {
    pub(crate) fn fetch_user_info(provider: &str, reason: impl Into<String>) -> Self {
        Self::FetchUserInfo {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures that are reported to the client as an authentication failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidState(_)
                | Self::StateExpired
                | Self::TokenExchange(_)
                | Self::FetchUserInfo { .. }
        )
    }
}
