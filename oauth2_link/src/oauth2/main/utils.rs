use base64::{
    Engine as _, alphabet,
    engine::{
        DecodePaddingMode,
        general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE},
    },
};

use crate::config::Settings;
use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::StatePayload;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

pub(super) fn encode_state(payload: &StatePayload) -> Result<String, OAuth2Error> {
    let json = serde_json::to_string(payload).map_err(|e| OAuth2Error::Serde(e.to_string()))?;
    Ok(URL_SAFE.encode(json))
}

/// Decodes the `state` query parameter.
///
/// Accepts both the URL-safe and the standard base64 alphabet, with or without padding.
pub(super) fn decode_state(state: &str) -> Result<StatePayload, OAuth2Error> {
    let bytes = URL_SAFE_LENIENT
        .decode(state)
        .or_else(|_| STANDARD_LENIENT.decode(state))
        .map_err(|e| OAuth2Error::InvalidState(format!("Failed to decode state: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| OAuth2Error::InvalidState(format!("Failed to parse state: {e}")))
}

/// True for a same-origin path such as `/welcome?tab=1`.
///
/// Rejects absolute and protocol-relative URLs and backslashes, which some
/// browsers treat as `/`.
pub(crate) fn is_safe_next_path(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control)
}

/// This service's callback URL for `provider`.
pub(crate) fn callback_uri(settings: &Settings, provider: &str) -> String {
    format!(
        "{}{}/oauth/callback/{}",
        settings.origin, settings.route_prefix, provider
    )
}
