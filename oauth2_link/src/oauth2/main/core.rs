use http::header::HeaderMap;

use crate::context::AuthContext;
use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::{NormalizedIdentity, StatePayload, TokenResponse};
use crate::session::{SessionKey, ensure_session};
use crate::utils::gen_random_alphanumeric;

use super::exchange::exchange_code_for_token;
use super::identity::IdentityProvider;
use super::state_token::StateTokenError;
use super::utils::{callback_uri, decode_state, encode_state, is_safe_next_path};

/// Length of the per-session state validation value
const STATE_VALIDATION_LEN: usize = 32;

/// Builds the provider authorization URL for the caller's session.
///
/// Creates the session when `session_id` is `None`; the returned headers then
/// carry its cookie. The session's state validation value is created on first
/// use and reused by later calls, so concurrent login attempts from one
/// session share it. An unsafe `next` is dropped.
pub async fn prepare_oauth2_auth_request(
    ctx: &AuthContext,
    provider: &str,
    session_id: Option<&str>,
    next: Option<&str>,
) -> Result<(String, HeaderMap), OAuth2Error> {
    let config = ctx.providers.lookup(provider)?;
    let (session_id, headers) = ensure_session(ctx, session_id)?;

    let candidate = gen_random_alphanumeric(STATE_VALIDATION_LEN)?;
    let secret = ctx
        .sessions
        .set_if_absent(&session_id, SessionKey::StateValidation, &candidate)
        .await?;

    let next = match next {
        Some(n) if is_safe_next_path(n) => Some(n.to_string()),
        Some(n) => {
            tracing::warn!("Dropping unsafe next target: {:?}", n);
            None
        }
        None => None,
    };

    let state = encode_state(&StatePayload {
        signature: ctx.signer.issue(&secret),
        next,
    })?;

    let redirect_uri = callback_uri(&ctx.settings, provider);
    let auth_url = url::Url::parse_with_params(
        &config.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("scope", config.scope.as_str()),
            ("state", state.as_str()),
        ],
    )
    .map_err(|e| OAuth2Error::Internal(format!("Invalid auth_uri for {provider}: {e}")))?;

    tracing::debug!("Auth URL: {}", auth_url);
    Ok((auth_url.into(), headers))
}

/// Checks the returned `state` against the session and consumes the
/// session's validation value.
///
/// Only one caller can consume a given value; a concurrent or repeated
/// callback for the same session fails as invalid.
pub(crate) async fn validate_state(
    ctx: &AuthContext,
    state: &str,
    session_id: Option<&str>,
) -> Result<StatePayload, OAuth2Error> {
    let payload = decode_state(state)?;

    let session_id =
        session_id.ok_or_else(|| OAuth2Error::InvalidState("No session".to_string()))?;
    let secret = ctx
        .sessions
        .get(session_id, SessionKey::StateValidation)
        .await?
        .ok_or_else(|| {
            OAuth2Error::InvalidState("No state validation value in session".to_string())
        })?;

    match ctx
        .signer
        .verify(&payload.signature, &secret, ctx.settings.state_max_age)
    {
        Ok(()) => {}
        Err(StateTokenError::Expired) => {
            tracing::warn!("Rejected callback: state token expired");
            return Err(OAuth2Error::StateExpired);
        }
        Err(StateTokenError::Invalid(reason)) => {
            tracing::warn!("Rejected callback: state token invalid ({})", reason);
            return Err(OAuth2Error::InvalidState(reason));
        }
    }

    match ctx
        .sessions
        .take(session_id, SessionKey::StateValidation)
        .await?
    {
        Some(taken) if taken == secret => Ok(payload),
        _ => {
            tracing::warn!("Rejected callback: state already consumed");
            Err(OAuth2Error::InvalidState(
                "State validation value already consumed".to_string(),
            ))
        }
    }
}

/// Exchanges the authorization code and normalizes the provider's view of the user.
pub(crate) async fn fetch_identity(
    ctx: &AuthContext,
    provider: &str,
    code: &str,
) -> Result<(TokenResponse, NormalizedIdentity), OAuth2Error> {
    let config = ctx.providers.lookup(provider)?;
    let token = exchange_code_for_token(ctx, config, code).await?;

    let identity = match IdentityProvider::from_name(provider) {
        Some(kind) => kind.normalize(ctx, config, &token).await?,
        None => {
            tracing::error!("No identity normalization for provider {}", provider);
            return Err(OAuth2Error::fetch_user_info(
                provider,
                "unsupported provider",
            ));
        }
    };

    Ok((token, identity))
}
