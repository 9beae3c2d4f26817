use askama::Template;
use axum::{http::StatusCode, response::Html};
use oauth2_link_axum::{AuthUser, O2L_ROUTE_PREFIX};

#[derive(Template)]
#[template(path = "index.j2")]
struct IndexTemplate<'a> {
    message: &'a str,
    logged_in: bool,
    auth_route_prefix: &'a str,
}

#[derive(Template)]
#[template(path = "protected.j2")]
struct ProtectedTemplate<'a> {
    user: AuthUser,
    auth_route_prefix: &'a str,
}

fn render(template: impl Template) -> Result<Html<String>, (StatusCode, String)> {
    template
        .render()
        .map(Html)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

pub(crate) async fn index(user: Option<AuthUser>) -> Result<Html<String>, (StatusCode, String)> {
    let message = match &user {
        Some(u) => format!("Hey {}!", u.username),
        None => "Pick a provider below to log in.".to_string(),
    };
    render(IndexTemplate {
        message: &message,
        logged_in: user.is_some(),
        auth_route_prefix: O2L_ROUTE_PREFIX.as_str(),
    })
}

pub(crate) async fn protected(user: AuthUser) -> Result<Html<String>, (StatusCode, String)> {
    tracing::trace!("User is staff?: {}", user.is_staff);
    render(ProtectedTemplate {
        user,
        auth_route_prefix: O2L_ROUTE_PREFIX.as_str(),
    })
}
