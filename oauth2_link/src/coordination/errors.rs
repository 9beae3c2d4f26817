//! Error types for the coordination layer

use thiserror::Error;

use crate::oauth2::OAuth2Error;
use crate::session::SessionError;
use crate::userdb::UserError;
use crate::utils::UtilError;

/// Errors that can occur while coordinating login, linking and account updates
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// No logged-in account where one is required
    #[error("Unauthorized access")]
    Unauthorized,

    /// Resource not found with context
    #[error("Resource not found: {resource_type} {resource_id}")]
    ResourceNotFound {
        resource_type: String,
        resource_id: String,
    },

    /// Every generated username collided with an existing one
    #[error("No unique username found after {0} attempts")]
    UsernameRetryExhausted(u32),

    /// Error from OAuth2 operations; its text is safe to show to the client
    #[error(transparent)]
    OAuth2Error(OAuth2Error),

    /// Error from the user database operations
    #[error("User error: {0}")]
    UserError(UserError),

    /// Error from Session operations
    #[error("Session error: {0}")]
    SessionError(SessionError),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    UtilsError(UtilError),
}

impl CoordinationError {
    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::Unauthorized => tracing::warn!("Unauthorized access"),
            Self::ResourceNotFound {
                resource_type,
                resource_id,
            } => tracing::warn!("Resource not found: {} {}", resource_type, resource_id),
            Self::UsernameRetryExhausted(attempts) => {
                tracing::error!("No unique username found after {} attempts", attempts)
            }
            Self::OAuth2Error(err) if err.is_auth_failure() => {
                tracing::warn!("OAuth2 authentication failed: {:?}", err)
            }
            Self::OAuth2Error(err) => tracing::error!("OAuth2 error: {:?}", err),
            Self::UserError(err) => tracing::error!("User error: {}", err),
            Self::SessionError(err) => tracing::error!("Session error: {}", err),
            Self::UtilsError(err) => tracing::error!("Utils error: {}", err),
        }
        self
    }
}

impl From<OAuth2Error> for CoordinationError {
    fn from(err: OAuth2Error) -> Self {
        Self::OAuth2Error(err)
    }
}

impl From<UserError> for CoordinationError {
    fn from(err: UserError) -> Self {
        Self::UserError(err)
    }
}

impl From<SessionError> for CoordinationError {
    fn from(err: SessionError) -> Self {
        Self::SessionError(err)
    }
}

impl From<UtilError> for CoordinationError {
    fn from(err: UtilError) -> Self {
        Self::UtilsError(err)
    }
}
