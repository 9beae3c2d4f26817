use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use serde::Deserialize;
use serde_json::Value;

use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::{NormalizedIdentity, TokenResponse};

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: Value,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<Value>,
}

/// Reads the user's identity from the `id_token` of a token response.
///
/// The token comes straight from the provider's token endpoint over TLS, so
/// its claims are read without verifying the signature.
pub(super) fn identity_from_id_token(
    provider: &str,
    token: &TokenResponse,
) -> Result<NormalizedIdentity, OAuth2Error> {
    let id_token = token
        .id_token
        .as_deref()
        .ok_or_else(|| OAuth2Error::fetch_user_info(provider, "id_token missing"))?;

    let claims = decode_claims(id_token)
        .map_err(|reason| OAuth2Error::fetch_user_info(provider, reason))?;
    let parsed: IdTokenClaims = serde_json::from_value(claims.clone())
        .map_err(|e| OAuth2Error::fetch_user_info(provider, e.to_string()))?;

    let provider_user_id = match &parsed.sub {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(OAuth2Error::fetch_user_info(provider, "sub claim missing")),
    };

    let email_verified = match parsed.email_verified {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    };

    Ok(NormalizedIdentity {
        provider_user_id,
        first_name: parsed.given_name.unwrap_or_default(),
        last_name: parsed.family_name.unwrap_or_default(),
        email: parsed.email.unwrap_or_default(),
        email_verified,
        user_info: claims,
    })
}

/// Decodes the payload segment of a compact JWT.
fn decode_claims(id_token: &str) -> Result<Value, String> {
    let mut segments = id_token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err("id_token is not three dot-separated segments".to_string()),
    };

    let mut padded = payload.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    let bytes = URL_SAFE
        .decode(padded)
        .map_err(|e| format!("id_token payload is not base64url: {e}"))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("id_token payload is not JSON: {e}"))
}
