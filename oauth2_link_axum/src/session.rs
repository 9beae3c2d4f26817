use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Redirect, Response},
};
use http::{Method, StatusCode, request::Parts};
use std::ops::Deref;

use oauth2_link::{AuthContext, User, current_user, get_session_id_from_headers};

use super::config::O2L_REDIRECT_ANON;
use super::error::{ErrorResponse, IntoResponseError};

/// The opaque session id carried by the request's session cookie, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionCookie(pub Option<String>);

impl SessionCookie {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for SessionCookie
where
    AuthContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AuthContext::from_ref(state);
        let session_id =
            get_session_id_from_headers(&parts.headers, &ctx.settings.session_cookie_name)
                .into_response_error()?;
        Ok(Self(session_id.map(str::to_string)))
    }
}

#[derive(Debug)]
pub struct AuthRedirect {
    method: Method,
}

impl AuthRedirect {
    fn new(method: Method) -> Self {
        Self { method }
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        if self.method == Method::GET {
            tracing::debug!("Redirecting to {}", O2L_REDIRECT_ANON.as_str());
            Redirect::temporary(O2L_REDIRECT_ANON.as_str()).into_response()
        } else {
            tracing::debug!("Unauthorized");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

/// The logged-in account, available as an Axum extractor
///
/// Page requests without a logged-in session are redirected to
/// `O2L_REDIRECT_ANON`; other methods get 401. Use `Option<AuthUser>` for
/// pages that also serve anonymous visitors.
///
/// ```no_run
/// use axum::{Router, routing::get};
/// use oauth2_link::AuthContext;
/// use oauth2_link_axum::AuthUser;
///
/// async fn protected(user: AuthUser) -> String {
///     format!("Hello, {}!", user.username)
/// }
///
/// fn app(ctx: AuthContext) -> Router {
///     Router::new().route("/protected", get(protected)).with_state(ctx)
/// }
/// ```
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let method = parts.method.clone();
        let ctx = AuthContext::from_ref(state);

        let SessionCookie(session_id) = SessionCookie::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthRedirect::new(method.clone()))?;

        match current_user(&ctx, session_id.as_deref()).await {
            Ok(Some(user)) => Ok(Self(user)),
            Ok(None) => Err(AuthRedirect::new(method)),
            Err(e) => {
                tracing::error!("Failed to resolve session user: {}", e);
                Err(AuthRedirect::new(method))
            }
        }
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    AuthContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let result = <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await;
        Ok(result.ok())
    }
}
