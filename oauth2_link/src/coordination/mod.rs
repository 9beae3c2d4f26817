//! Authentication coordination module
//!
//! High-level operations that tie the OAuth2 flow, the session and the
//! account store together. This is the main entry point for HTTP adapters.
//!
//! - `account`: resolving an identity to a local account
//! - `admin`: account activation and the administrator allow-list
//! - `errors`: error type for coordination operations
//! - `oauth2`: callback handling and identity link management

mod account;
mod admin;
mod errors;
mod oauth2;

pub use admin::activate_account;
pub use errors::CoordinationError;
pub use oauth2::{
    CallbackOutcome, LinkSummaries, LinkSummary, delete_link_core, handle_oauth2_callback,
    list_links_core, provider_directory,
};
