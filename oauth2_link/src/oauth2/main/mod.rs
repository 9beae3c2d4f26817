mod core;
mod exchange;
mod facebook;
mod google;
mod identity;
mod state_token;
mod utils;

pub use core::prepare_oauth2_auth_request;
pub use state_token::{StateSigner, StateTokenError};

pub(crate) use core::{fetch_identity, validate_state};
pub(crate) use utils::{callback_uri, is_safe_next_path};
