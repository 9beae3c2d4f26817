use serde_json::Value;

use crate::context::AuthContext;
use crate::oauth2::NormalizedIdentity;
use crate::userdb::{AccountStore, IdentityLink, User, UserError};
use crate::utils::{UtilError, gen_random_alphanumeric};

use super::errors::CoordinationError;

/// Random characters appended to the username prefix
const USERNAME_SUFFIX_LEN: usize = 7;

/// Maps an identity returned by `provider` to a local account.
///
/// An authenticated caller always keeps their account and gains (or
/// refreshes) the link. An anonymous caller reuses the account already
/// linked to the identity, or gets a new one.
pub(super) async fn resolve_account(
    ctx: &AuthContext,
    provider: &str,
    identity: &NormalizedIdentity,
    access_info: Value,
    current_user: Option<User>,
) -> Result<User, CoordinationError> {
    let link_for = |user_id: &str| {
        IdentityLink::new(
            provider,
            &identity.provider_user_id,
            user_id,
            access_info.clone(),
            identity.user_info.clone(),
        )
    };

    if let Some(user) = current_user {
        ctx.accounts.upsert_link(link_for(&user.id)).await?;
        tracing::info!("Linked {} identity to user {}", provider, user.id);
        return Ok(user);
    }

    if let Some(user) = ctx
        .accounts
        .find_user_by_link(provider, &identity.provider_user_id)
        .await?
    {
        ctx.accounts.upsert_link(link_for(&user.id)).await?;
        tracing::info!("Returning {} user {}", provider, user.id);
        return Ok(user);
    }

    let prefix = ctx.settings.username_prefix.clone();
    create_account_with_retry(
        ctx.accounts.as_ref(),
        provider,
        identity,
        access_info,
        ctx.settings.username_max_attempts,
        || Ok(format!("{prefix}{}", gen_random_alphanumeric(USERNAME_SUFFIX_LEN)?)),
    )
    .await
}

/// Creates an OAuth-only account for `identity`, regenerating the username
/// on each uniqueness violation up to `max_attempts` times.
///
/// When a concurrent login for the same identity created its account first,
/// that account is returned instead.
pub(super) async fn create_account_with_retry<F>(
    store: &dyn AccountStore,
    provider: &str,
    identity: &NormalizedIdentity,
    access_info: Value,
    max_attempts: u32,
    mut gen_username: F,
) -> Result<User, CoordinationError>
where
    F: FnMut() -> Result<String, UtilError>,
{
    for attempt in 1..=max_attempts {
        let mut user = User::new(gen_username()?);
        user.first_name = identity.first_name.clone();
        user.last_name = identity.last_name.clone();
        user.email = identity.email.clone();
        user.is_verified = identity.email_verified;
        user.has_usable_password = false;

        let link = IdentityLink::new(
            provider,
            &identity.provider_user_id,
            &user.id,
            access_info.clone(),
            identity.user_info.clone(),
        );

        match store.create_user_with_link(user, Some(link.clone())).await {
            Ok(user) => {
                tracing::info!(
                    "Created user {} ({}) for {} identity",
                    user.id,
                    user.username,
                    provider
                );
                return Ok(user);
            }
            Err(UserError::UsernameTaken(username)) => {
                tracing::warn!(
                    "Username {} taken, retrying (attempt {}/{})",
                    username,
                    attempt,
                    max_attempts
                );
            }
            Err(UserError::LinkTaken { .. }) => {
                if let Some(existing) = store
                    .find_user_by_link(provider, &identity.provider_user_id)
                    .await?
                {
                    tracing::info!(
                        "Concurrent login created user {} first, reusing it",
                        existing.id
                    );
                    store
                        .upsert_link(IdentityLink {
                            user_id: existing.id.clone(),
                            ..link
                        })
                        .await?;
                    return Ok(existing);
                }
                tracing::warn!("Link vanished after conflict, retrying (attempt {attempt})");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(CoordinationError::UsernameRetryExhausted(max_attempts).log())
}
