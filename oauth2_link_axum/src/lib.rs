//! oauth2_link_axum - Axum routes and extractors for the oauth2_link engine

mod config;
mod error;
mod oauth2;
mod router;
mod session;

#[cfg(test)]
mod test_utils;

pub use config::O2L_REDIRECT_ANON;
pub use error::ErrorResponse;
pub use router::{oauth2_link_router, oauth2_link_router_no_trace};
pub use session::{AuthRedirect, AuthUser, SessionCookie};

// Re-export the route prefix and initialization function from oauth2_link crate
pub use oauth2_link::{AuthContext, O2L_ROUTE_PREFIX, init};
