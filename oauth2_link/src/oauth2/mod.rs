mod config;
mod errors;
mod main;
mod types;

pub use config::{ProviderConfig, ProviderRegistry};
pub use errors::OAuth2Error;
pub use main::{StateSigner, StateTokenError, prepare_oauth2_auth_request};
pub use types::{AuthResponse, NormalizedIdentity};

pub(crate) use main::{callback_uri, fetch_identity, is_safe_next_path, validate_state};
