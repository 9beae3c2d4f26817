//! Central configuration for the oauth2_link crate

use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// Route prefix for all oauth2_link endpoints
///
/// Default: "/o2l"
pub static O2L_ROUTE_PREFIX: LazyLock<String> =
    LazyLock::new(|| std::env::var("O2L_ROUTE_PREFIX").unwrap_or_else(|_| "/o2l".to_string()));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Process-wide settings shared by every flow.
///
/// Built once by [`Settings::from_env`] in production; tests construct it
/// with [`Settings::new`] and override fields directly.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Scheme and host of this service, e.g. `https://example.com`
    pub origin: String,
    pub route_prefix: String,
    pub state_max_age: Duration,
    pub http_timeout: Duration,
    /// Lower-cased administrator email addresses
    pub admin_emails: Vec<String>,
    pub username_prefix: String,
    pub username_max_attempts: u32,
    pub session_cookie_name: String,
    pub session_max_age: u64,
}

impl Settings {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            route_prefix: "/o2l".to_string(),
            state_max_age: Duration::from_secs(300),
            http_timeout: Duration::from_secs(30),
            admin_emails: Vec::new(),
            username_prefix: "user_".to_string(),
            username_max_attempts: 10,
            session_cookie_name: "__Host-SessionId".to_string(),
            session_max_age: 600,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let origin = required("ORIGIN")?;
        let mut settings = Self::new(origin);

        settings.route_prefix = O2L_ROUTE_PREFIX.clone();
        settings.state_max_age = Duration::from_secs(parsed("OAUTH2_STATE_MAX_AGE", 300)?);
        settings.http_timeout = Duration::from_secs(parsed("OAUTH2_HTTP_TIMEOUT", 30)?);
        settings.admin_emails = std::env::var("ADMIN_EMAILS")
            .map(|v| parse_email_list(&v))
            .unwrap_or_default();
        if let Ok(prefix) = std::env::var("USERNAME_PREFIX") {
            settings.username_prefix = prefix;
        }
        settings.username_max_attempts = parsed("USERNAME_MAX_ATTEMPTS", 10)?;
        settings.session_cookie_name = crate::session::SESSION_COOKIE_NAME.clone();
        settings.session_max_age = *crate::session::SESSION_COOKIE_MAX_AGE;

        if settings.username_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "USERNAME_MAX_ATTEMPTS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(settings)
    }

    /// Case-insensitive membership test against the administrator allow-list.
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        !email.is_empty() && self.admin_emails.iter().any(|e| *e == email)
    }
}

pub(crate) fn required(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name.to_string())),
    }
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            reason: format!("cannot parse {v:?}"),
        }),
        Err(_) => Ok(default),
    }
}

pub(crate) fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
