use serde::Deserialize;
use serde_json::Value;

use crate::context::AuthContext;
use crate::oauth2::config::ProviderConfig;
use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::{NormalizedIdentity, TokenResponse};

#[derive(Debug, Deserialize)]
struct Profile {
    id: Value,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Fetches the user's profile with the bearer access token.
///
/// The profile endpoint does not report verification; a non-empty email
/// counts as verified.
pub(super) async fn fetch_profile(
    ctx: &AuthContext,
    config: &ProviderConfig,
    token: &TokenResponse,
) -> Result<NormalizedIdentity, OAuth2Error> {
    let provider = config.name.as_str();
    let userinfo_uri = config
        .userinfo_uri
        .as_deref()
        .ok_or_else(|| OAuth2Error::fetch_user_info(provider, "no profile endpoint configured"))?;
    let access_token = token
        .access_token
        .as_deref()
        .ok_or_else(|| OAuth2Error::fetch_user_info(provider, "access_token missing"))?;

    let response = ctx
        .http
        .post(userinfo_uri)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Profile request to {} failed: {}", provider, e);
            OAuth2Error::fetch_user_info(provider, e.to_string())
        })?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        tracing::error!("Profile request to {} returned {}", provider, status);
        return Err(OAuth2Error::fetch_user_info(provider, status.to_string()));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| OAuth2Error::fetch_user_info(provider, e.to_string()))?;

    profile_to_identity(provider, body)
}

fn profile_to_identity(provider: &str, body: Value) -> Result<NormalizedIdentity, OAuth2Error> {
    let profile: Profile = serde_json::from_value(body.clone())
        .map_err(|e| OAuth2Error::fetch_user_info(provider, e.to_string()))?;

    let provider_user_id = match &profile.id {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(OAuth2Error::fetch_user_info(provider, "profile id missing")),
    };

    let email = profile.email.unwrap_or_default();
    Ok(NormalizedIdentity {
        provider_user_id,
        first_name: profile.first_name.unwrap_or_default(),
        last_name: profile.last_name.unwrap_or_default(),
        email_verified: !email.is_empty(),
        email,
        user_info: body,
    })
}
