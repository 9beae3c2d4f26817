use axum::Json;
use http::StatusCode;
use serde_json::{Value, json};

use oauth2_link::{CoordinationError, OAuth2Error, SessionError};

/// Error half of every handler result: a status and `{"detail": ...}`.
pub type ErrorResponse = (StatusCode, Json<Value>);

const INTERNAL_DETAIL: &str = "Internal server error.";

/// Helper trait for converting engine errors to [`ErrorResponse`]
pub(crate) trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, ErrorResponse>;
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> ErrorResponse {
    (status, Json(json!({ "detail": detail.into() })))
}

/// Only authentication failures and lookups report their own text; anything
/// else is internal and reported generically.
fn to_error_response(err: &CoordinationError) -> ErrorResponse {
    match err {
        CoordinationError::OAuth2Error(e @ OAuth2Error::ProviderNotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, e.to_string())
        }
        CoordinationError::OAuth2Error(e) if e.is_auth_failure() => {
            error_response(StatusCode::FORBIDDEN, e.to_string())
        }
        CoordinationError::ResourceNotFound { .. } => {
            error_response(StatusCode::NOT_FOUND, "Not found.")
        }
        CoordinationError::Unauthorized => error_response(
            StatusCode::UNAUTHORIZED,
            "Authentication credentials were not provided.",
        ),
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_DETAIL),
    }
}

impl<T> IntoResponseError<T> for Result<T, CoordinationError> {
    fn into_response_error(self) -> Result<T, ErrorResponse> {
        self.map_err(|e| to_error_response(&e))
    }
}

impl<T> IntoResponseError<T> for Result<T, OAuth2Error> {
    fn into_response_error(self) -> Result<T, ErrorResponse> {
        self.map_err(|e| to_error_response(&CoordinationError::from(e).log()))
    }
}

impl<T> IntoResponseError<T> for Result<T, SessionError> {
    fn into_response_error(self) -> Result<T, ErrorResponse> {
        self.map_err(|e| match e {
            SessionError::HeaderError(msg) => error_response(StatusCode::BAD_REQUEST, msg),
            other => to_error_response(&CoordinationError::from(other).log()),
        })
    }
}
