use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query parameters the provider sends back to the callback endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub code: String,
    pub state: String,
}

/// JSON carried (base64 encoded) in the OAuth2 `state` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StatePayload {
    pub(crate) signature: String,
    pub(crate) next: Option<String>,
}

/// Token endpoint response. Unknown fields are kept so the whole response
/// can be stored as the link's `access_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub(crate) access_token: Option<String>,
    #[serde(default)]
    pub(crate) id_token: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

/// Provider-independent view of the authenticated end user.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedIdentity {
    pub provider_user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub email_verified: bool,
    /// Raw claims or profile document as returned by the provider
    pub user_info: Value,
}
