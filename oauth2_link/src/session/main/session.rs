use http::header::{COOKIE, HeaderMap};

use crate::context::AuthContext;
use crate::session::errors::SessionError;
use crate::session::types::SessionKey;
use crate::userdb::User;
use crate::utils::{gen_random_string, header_set_cookie};

/// Returns the caller's session id, creating a fresh one when there is none.
///
/// The returned headers carry the `Set-Cookie` for a newly created session and
/// are empty otherwise.
pub(crate) fn ensure_session(
    ctx: &AuthContext,
    session_id: Option<&str>,
) -> Result<(String, HeaderMap), SessionError> {
    let mut headers = HeaderMap::new();
    if let Some(session_id) = session_id {
        return Ok((session_id.to_string(), headers));
    }

    let session_id = gen_random_string(32)?;
    header_set_cookie(
        &mut headers,
        &ctx.settings.session_cookie_name,
        &session_id,
        ctx.settings.session_max_age as i64,
    )?;
    tracing::debug!("Created new session");
    Ok((session_id, headers))
}

/// Logs `user_id` in under a brand-new session id.
///
/// The previous session, if any, is cleared so a session id seen before
/// authentication never becomes an authenticated one.
#[tracing::instrument(skip(ctx, old_session_id))]
pub(crate) async fn login(
    ctx: &AuthContext,
    old_session_id: Option<&str>,
    user_id: &str,
) -> Result<HeaderMap, SessionError> {
    let session_id = gen_random_string(32)?;
    ctx.sessions
        .set(&session_id, SessionKey::UserId, user_id)
        .await?;

    if let Some(old) = old_session_id {
        ctx.sessions.clear(old).await?;
    }

    let mut headers = HeaderMap::new();
    header_set_cookie(
        &mut headers,
        &ctx.settings.session_cookie_name,
        &session_id,
        ctx.settings.session_max_age as i64,
    )?;

    tracing::info!("Session established for user {}", user_id);
    Ok(headers)
}

/// Resolves the account logged in under `session_id`.
///
/// A session pointing at an account that no longer exists counts as anonymous.
pub async fn current_user(
    ctx: &AuthContext,
    session_id: Option<&str>,
) -> Result<Option<User>, SessionError> {
    let Some(session_id) = session_id else {
        return Ok(None);
    };
    let Some(user_id) = ctx.sessions.get(session_id, SessionKey::UserId).await? else {
        return Ok(None);
    };

    let user = ctx.accounts.get_user(&user_id).await?;
    if user.is_none() {
        tracing::warn!("Session refers to missing user {}", user_id);
    }
    Ok(user)
}

/// Clears the session and returns headers that expire the cookie.
pub async fn logout(
    ctx: &AuthContext,
    session_id: Option<&str>,
) -> Result<HeaderMap, SessionError> {
    if let Some(session_id) = session_id {
        ctx.sessions.clear(session_id).await?;
    }

    let mut headers = HeaderMap::new();
    header_set_cookie(&mut headers, &ctx.settings.session_cookie_name, "", -86400)?;
    Ok(headers)
}

pub fn get_session_id_from_headers<'a>(
    headers: &'a HeaderMap,
    cookie_name: &str,
) -> Result<Option<&'a str>, SessionError> {
    let Some(cookie_header) = headers.get(COOKIE) else {
        tracing::debug!("No cookie header found");
        return Ok(None);
    };

    let cookie_str = cookie_header.to_str().map_err(|e| {
        tracing::error!("Invalid cookie header: {}", e);
        SessionError::HeaderError("Invalid cookie header".to_string())
    })?;

    let session_id = cookie_str.split(';').map(|s| s.trim()).find_map(|s| {
        let mut parts = s.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some(k), Some(v)) if k == cookie_name && !v.is_empty() => Some(v),
            _ => None,
        }
    });

    if session_id.is_none() {
        tracing::debug!("No session cookie '{}' found in cookies", cookie_name);
    }

    Ok(session_id)
}
