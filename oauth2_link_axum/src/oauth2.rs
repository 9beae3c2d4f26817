use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use std::collections::BTreeMap;

use oauth2_link::{
    AuthContext, AuthResponse, CallbackOutcome, LinkSummaries, delete_link_core,
    handle_oauth2_callback, list_links_core, logout, prepare_oauth2_auth_request,
    provider_directory,
};

use super::error::{ErrorResponse, IntoResponseError};
use super::session::SessionCookie;

pub(super) fn router() -> Router<AuthContext> {
    Router::new()
        .route("/", get(directory))
        .route("/provider/{provider}", get(authorize))
        .route("/callback/{provider}", get(callback))
        .route("/links", get(list_links))
        .route("/links/{provider}/{provider_user_id}", delete(delete_link))
        .route("/logout", post(post_logout))
}

/// 302 to `location`
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

async fn directory(State(ctx): State<AuthContext>) -> Json<BTreeMap<String, String>> {
    Json(provider_directory(&ctx))
}

#[derive(Debug, Deserialize)]
struct AuthorizeQuery {
    next: Option<String>,
}

async fn authorize(
    State(ctx): State<AuthContext>,
    session: SessionCookie,
    Path(provider): Path<String>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<(HeaderMap, Response), ErrorResponse> {
    let (auth_url, headers) = prepare_oauth2_auth_request(
        &ctx,
        &provider,
        session.as_deref(),
        query.next.as_deref(),
    )
    .await
    .into_response_error()?;

    Ok((headers, found(&auth_url)))
}

/// Both fields are optional so a provider's error redirect (no `code`) or a
/// stripped `state` fails validation with 403 instead of a query rejection.
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    state: Option<String>,
    code: Option<String>,
}

async fn callback(
    State(ctx): State<AuthContext>,
    session: SessionCookie,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<(HeaderMap, Response), ErrorResponse> {
    let auth_response = AuthResponse {
        code: query.code.unwrap_or_default(),
        state: query.state.unwrap_or_default(),
    };

    let (headers, outcome) =
        handle_oauth2_callback(&ctx, &provider, &auth_response, session.as_deref())
            .await
            .map_err(|e| e.log())
            .into_response_error()?;

    let response = match outcome {
        CallbackOutcome::Redirect(next) => found(&next),
        CallbackOutcome::ProviderUserId(id) => Json(id).into_response(),
    };
    Ok((headers, response))
}

async fn list_links(
    State(ctx): State<AuthContext>,
    session: SessionCookie,
) -> Result<Json<LinkSummaries>, ErrorResponse> {
    list_links_core(&ctx, session.as_deref())
        .await
        .map(Json)
        .into_response_error()
}

async fn delete_link(
    State(ctx): State<AuthContext>,
    session: SessionCookie,
    Path((provider, provider_user_id)): Path<(String, String)>,
) -> Result<StatusCode, ErrorResponse> {
    delete_link_core(&ctx, session.as_deref(), &provider, &provider_user_id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .into_response_error()
}

async fn post_logout(
    State(ctx): State<AuthContext>,
    session: SessionCookie,
) -> Result<(HeaderMap, StatusCode), ErrorResponse> {
    let headers = logout(&ctx, session.as_deref())
        .await
        .into_response_error()?;
    Ok((headers, StatusCode::NO_CONTENT))
}
