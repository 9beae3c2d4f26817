use crate::config::Settings;
use crate::context::AuthContext;
use crate::userdb::User;

use super::errors::CoordinationError;

/// Marks the account verified and applies the administrator allow-list.
///
/// Called on the "account activated" signal, outside the OAuth2 flow.
#[tracing::instrument(skip(ctx))]
pub async fn activate_account(ctx: &AuthContext, user_id: &str) -> Result<User, CoordinationError> {
    let user = ctx.accounts.get_user(user_id).await?.ok_or_else(|| {
        CoordinationError::ResourceNotFound {
            resource_type: "User".to_string(),
            resource_id: user_id.to_string(),
        }
        .log()
    })?;

    let mut updated = User {
        is_verified: true,
        ..user
    };
    if grant_admin_if_listed(&ctx.settings, &mut updated) {
        tracing::info!("Granted staff and superuser to {}", updated.id);
    }

    Ok(ctx.accounts.update_user(&updated).await?)
}

/// Promotes `user` when their email is on the allow-list. Never demotes.
///
/// Returns whether the privileges changed.
pub(crate) fn grant_admin_if_listed(settings: &Settings, user: &mut User) -> bool {
    if !settings.is_admin_email(&user.email) || (user.is_staff && user.is_superuser) {
        return false;
    }
    user.is_staff = true;
    user.is_superuser = true;
    true
}
