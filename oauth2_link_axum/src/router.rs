//! Router for all authentication endpoints

use axum::Router;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use oauth2_link::AuthContext;

/// Create the router for all authentication endpoints
///
/// Mount it under `O2L_ROUTE_PREFIX` so the endpoints match the callback
/// URLs registered with the providers:
/// - {O2L_ROUTE_PREFIX}/oauth
/// - {O2L_ROUTE_PREFIX}/oauth/provider/{provider}
/// - {O2L_ROUTE_PREFIX}/oauth/callback/{provider}
/// - {O2L_ROUTE_PREFIX}/oauth/links
/// - {O2L_ROUTE_PREFIX}/oauth/logout
pub fn oauth2_link_router(ctx: AuthContext) -> Router {
    oauth2_link_router_no_trace(ctx).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as [`oauth2_link_router`] without the HTTP tracing middleware.
pub fn oauth2_link_router_no_trace(ctx: AuthContext) -> Router {
    Router::new()
        .nest("/oauth", super::oauth2::router())
        .with_state(ctx)
}
