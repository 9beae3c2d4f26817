mod config;
mod errors;
mod main;
mod store;
mod types;

pub use config::SESSION_COOKIE_NAME;
pub use errors::SessionError;
pub use main::{current_user, get_session_id_from_headers, logout};
pub use store::{CacheSessionStore, SessionStore};
pub use types::SessionKey;

pub(crate) use config::SESSION_COOKIE_MAX_AGE;
pub(crate) use main::{ensure_session, login};
