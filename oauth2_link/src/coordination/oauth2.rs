use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::context::AuthContext;
use crate::oauth2::{
    AuthResponse, OAuth2Error, callback_uri, fetch_identity, is_safe_next_path, validate_state,
};
use crate::session::{current_user, login};
use crate::userdb::{User, group_links};

use super::account::resolve_account;
use super::errors::CoordinationError;

/// What the client receives after a successful callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Redirect to the `next` path carried in the state
    Redirect(String),
    /// No `next` was given; respond with the provider's user id
    ProviderUserId(String),
}

/// Completes an authorization-code login for `provider`.
///
/// Validates and consumes the state, exchanges the code, resolves the
/// identity to a local account and logs that account in under a new session.
/// The returned headers carry the new session cookie.
#[tracing::instrument(skip(ctx, auth_response, session_id))]
pub async fn handle_oauth2_callback(
    ctx: &AuthContext,
    provider: &str,
    auth_response: &AuthResponse,
    session_id: Option<&str>,
) -> Result<(HeaderMap, CallbackOutcome), CoordinationError> {
    ctx.providers.lookup(provider)?;

    let state = validate_state(ctx, &auth_response.state, session_id).await?;
    let (token, identity) = fetch_identity(ctx, provider, &auth_response.code).await?;

    let access_info =
        serde_json::to_value(&token).map_err(|e| OAuth2Error::Serde(e.to_string()))?;
    let caller = current_user(ctx, session_id).await?;
    let user = resolve_account(ctx, provider, &identity, access_info, caller).await?;

    let headers = login(ctx, session_id, &user.id).await?;

    let outcome = match state.next {
        Some(next) if is_safe_next_path(&next) => CallbackOutcome::Redirect(next),
        Some(next) => {
            tracing::warn!("Ignoring unsafe next target in state: {:?}", next);
            CallbackOutcome::ProviderUserId(identity.provider_user_id)
        }
        None => CallbackOutcome::ProviderUserId(identity.provider_user_id),
    };

    Ok((headers, outcome))
}

/// `{provider name: callback URL}` for every configured provider.
pub fn provider_directory(ctx: &AuthContext) -> BTreeMap<String, String> {
    ctx.providers
        .names()
        .map(|name| (name.to_string(), callback_uri(&ctx.settings, name)))
        .collect()
}

/// An identity link as shown to its owner; access tokens are left out.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LinkSummary {
    pub user_info: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub type LinkSummaries = BTreeMap<String, BTreeMap<String, LinkSummary>>;

async fn require_user(
    ctx: &AuthContext,
    session_id: Option<&str>,
) -> Result<User, CoordinationError> {
    current_user(ctx, session_id)
        .await?
        .ok_or_else(|| CoordinationError::Unauthorized.log())
}

/// The logged-in caller's links grouped `provider -> provider_user_id`.
pub async fn list_links_core(
    ctx: &AuthContext,
    session_id: Option<&str>,
) -> Result<LinkSummaries, CoordinationError> {
    let user = require_user(ctx, session_id).await?;
    let links = ctx.accounts.get_links(&user.id).await?;

    Ok(group_links(links)
        .into_iter()
        .map(|(provider, by_id)| {
            let summaries = by_id
                .into_iter()
                .map(|(id, link)| {
                    (
                        id,
                        LinkSummary {
                            user_info: link.user_info,
                            created_at: link.created_at,
                            updated_at: link.updated_at,
                        },
                    )
                })
                .collect();
            (provider, summaries)
        })
        .collect())
}

/// Removes one of the logged-in caller's links.
///
/// A link that does not exist or belongs to someone else is reported as not found.
pub async fn delete_link_core(
    ctx: &AuthContext,
    session_id: Option<&str>,
    provider: &str,
    provider_user_id: &str,
) -> Result<(), CoordinationError> {
    let user = require_user(ctx, session_id).await?;

    if !ctx
        .accounts
        .delete_link(&user.id, provider, provider_user_id)
        .await?
    {
        return Err(CoordinationError::ResourceNotFound {
            resource_type: "IdentityLink".to_string(),
            resource_id: format!("{provider}/{provider_user_id}"),
        }
        .log());
    }

    tracing::info!("User {} unlinked {} identity", user.id, provider);
    Ok(())
}
