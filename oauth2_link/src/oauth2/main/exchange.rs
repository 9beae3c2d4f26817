use crate::context::AuthContext;
use crate::oauth2::config::ProviderConfig;
use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::TokenResponse;

use super::utils::callback_uri;

/// POSTs the authorization code to the provider's token endpoint.
///
/// Any failure is terminal; provider errors are not retried.
pub(super) async fn exchange_code_for_token(
    ctx: &AuthContext,
    config: &ProviderConfig,
    code: &str,
) -> Result<TokenResponse, OAuth2Error> {
    let redirect_uri = callback_uri(&ctx.settings, &config.name);
    let response = ctx
        .http
        .post(config.token_uri.as_str())
        .form(&[
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Token exchange request to {} failed: {}", config.name, e);
            OAuth2Error::TokenExchange(e.to_string())
        })?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        tracing::error!("Token exchange with {} returned {}", config.name, status);
        return Err(OAuth2Error::TokenExchange(status.to_string()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| OAuth2Error::TokenExchange(e.to_string()))?;
    let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
        tracing::error!("Malformed token response from {}: {}", config.name, e);
        OAuth2Error::TokenExchange(e.to_string())
    })?;

    tracing::debug!("Token exchange with {} succeeded", config.name);
    Ok(token)
}
